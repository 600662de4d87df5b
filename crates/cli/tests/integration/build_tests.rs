//! `kiln debug` / `kiln release` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn first_build_compiles_links_and_reports() {
  let env = TestEnv::sample_project();

  env
    .kiln_cmd()
    .arg("debug")
    .assert()
    .success()
    .stdout(predicate::str::contains("Checking dependencies..."))
    .stdout(predicate::str::contains("Creating build directory..."))
    .stdout(predicate::str::contains("Building engine..."))
    .stdout(predicate::str::contains(" + Compile engine/src/core.c"))
    .stdout(predicate::str::contains(" + Compile engine/src/platform/linux/window.c"))
    .stdout(predicate::str::contains(" = Assembled"))
    .stdout(predicate::str::contains(" + Compile assets/shaders/basic.vert"))
    .stdout(predicate::str::contains(" = Has been updated"))
    .stdout(predicate::str::contains("Building completed successfully!"));

  assert!(env.path("bin/libengine.so").exists());
  assert!(env.path("bin/testapp").exists());
  assert!(env.path("bin/objs/engine/platform/linux/window.o").exists());
  assert!(!env.path("bin/objs/engine/platform/windows").exists());
  assert!(env.path("assets/shaders/basic.vert.spv").exists());
  assert!(env.path("assets/shaders/basic.frag.spv").exists());
  assert_eq!(env.link_calls(), vec!["bin/libengine.so", "bin/testapp"]);
}

#[test]
fn second_build_finds_no_changes() {
  let env = TestEnv::sample_project();
  env.kiln_cmd().arg("debug").assert().success();

  env
    .kiln_cmd()
    .arg("debug")
    .assert()
    .success()
    .stdout(predicate::str::contains(" ! Already exists bin/objs/engine/core.o"))
    .stdout(predicate::str::contains(" ! Already exists assets/shaders/basic.frag.spv"))
    .stdout(predicate::str::contains(" = No changes found"))
    .stdout(predicate::str::contains("+ Compile").not())
    .stdout(predicate::str::contains("Creating build directory").not());

  assert_eq!(env.compile_calls().len(), 5);
  assert_eq!(env.link_calls().len(), 2);
}

#[test]
fn touched_source_is_the_only_recompile() {
  let env = TestEnv::sample_project();
  env.kiln_cmd().arg("debug").assert().success();
  env.touch("testapp/src/main.c");

  env
    .kiln_cmd()
    .arg("debug")
    .assert()
    .success()
    .stdout(predicate::str::contains(" + Compile testapp/src/main.c"))
    .stdout(predicate::str::contains(" = Has been updated"));

  let calls = env.compile_calls();
  assert_eq!(calls.len(), 6);
  assert_eq!(calls[5], "testapp/src/main.c");
  assert_eq!(env.link_calls(), vec!["bin/libengine.so", "bin/testapp", "bin/testapp"]);
}

#[test]
fn every_compile_failure_is_reported_and_nothing_links() {
  let env = TestEnv::sample_project();
  env.write_file("engine/src/a.c", "FAIL");
  env.write_file("engine/src/b.c", "ok");
  env.write_file("engine/src/d.c", "FAIL");

  env
    .kiln_cmd()
    .arg("debug")
    .assert()
    .code(1)
    .stdout(predicate::str::contains(" x Failed engine/src/a.c"))
    .stdout(predicate::str::contains("engine/src/a.c:1: error: FAIL found"))
    .stdout(predicate::str::contains(" x Failed engine/src/d.c"))
    .stdout(predicate::str::contains(" + Compile engine/src/b.c"))
    .stdout(predicate::str::contains("Building testapp").not())
    .stderr(predicate::str::contains("Error: failed to compile engine"));

  assert!(env.link_calls().is_empty());
  assert!(!env.path("bin/libengine.so").exists());
}

#[test]
fn link_failure_shows_the_linker_output_once() {
  let env = TestEnv::sample_project();
  env.write_file("testapp/src/render.c", "UNRESOLVED");

  env
    .kiln_cmd()
    .arg("debug")
    .assert()
    .code(1)
    .stdout(predicate::str::contains("ld: undefined reference to 'vk_init'"))
    .stderr(predicate::str::contains("Error: failed to link testapp: failed to link "))
    .stderr(predicate::str::contains("(exit code 1)").count(1))
    .stderr(predicate::str::contains("Some(").not());

  assert!(env.path("bin/libengine.so").exists());
  assert!(!env.path("bin/testapp").exists());
}

#[test]
fn project_dir_option_builds_from_outside_the_project() {
  let env = TestEnv::sample_project();
  let parent = env.temp.path().parent().unwrap();
  let name = env.temp.path().file_name().unwrap();

  env
    .kiln_cmd()
    .current_dir(parent)
    .arg("-C")
    .arg(name)
    .arg("debug")
    .assert()
    .success()
    .stdout(predicate::str::contains(" + Compile engine/src/core.c"))
    .stdout(predicate::str::contains("x Failed").not());

  assert!(env.compile_calls().contains(&"testapp/src/main.c".to_string()));
  assert_eq!(env.link_calls(), vec!["bin/libengine.so", "bin/testapp"]);
  assert!(env.path("bin/testapp").exists());
}

#[test]
fn deleted_output_is_relinked_without_recompiling() {
  let env = TestEnv::sample_project();
  env.kiln_cmd().arg("debug").assert().success();
  std::fs::remove_file(env.path("bin/testapp")).unwrap();

  env
    .kiln_cmd()
    .arg("debug")
    .assert()
    .success()
    .stdout(predicate::str::contains(" = Assembled"))
    .stdout(predicate::str::contains("+ Compile").not());

  assert!(env.path("bin/testapp").exists());
  assert_eq!(env.compile_calls().len(), 5);
}

#[test]
fn switching_to_release_rebuilds_objects_but_not_shaders() {
  let env = TestEnv::sample_project();
  env.kiln_cmd().arg("debug").assert().success();

  env
    .kiln_cmd()
    .arg("release")
    .assert()
    .success()
    .stdout(predicate::str::contains("Build type changed from debug to release"))
    .stdout(predicate::str::contains(" + Compile engine/src/core.c"))
    .stdout(predicate::str::contains(" ! Already exists assets/shaders/basic.vert.spv"));

  assert_eq!(env.compile_calls().len(), 8);
  assert_eq!(std::fs::read_to_string(env.path("bin/.profile")).unwrap(), "release");
}

#[test]
fn missing_tools_abort_before_building() {
  let env = TestEnv::from_fixture("missing_tools.toml");
  env.write_file("src/main.c", "main");

  env
    .kiln_cmd()
    .arg("debug")
    .assert()
    .code(1)
    .stdout(predicate::str::contains("Checking dependencies..."))
    .stderr(predicate::str::contains(
      "Error: Missing tools: kiln-missing-cc, kiln-missing-generator",
    ))
    .stderr(predicate::str::contains(
      "Error: Please install the missing tools and libraries before building. Aborted.",
    ));

  assert!(!env.path("bin").exists());
}

#[test]
fn jobs_flag_overrides_config() {
  let env = TestEnv::sample_project();

  env
    .kiln_cmd()
    .args(["-j", "1", "-v", "debug"])
    .assert()
    .success()
    .stderr(predicate::str::contains("jobs=1"));
}
