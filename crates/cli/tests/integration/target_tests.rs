//! `kiln target <name> <build_type> <system>` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn builds_only_the_named_target() {
  let env = TestEnv::sample_project();

  env
    .kiln_cmd()
    .args(["target", "shaders", "release", "linux"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Building shaders..."))
    .stdout(predicate::str::contains("Building engine").not());

  assert!(env.path("assets/shaders/basic.vert.spv").exists());
  assert!(env.link_calls().is_empty());
  assert!(!env.path("bin/objs").exists());
}

#[test]
fn windows_build_uses_windows_sources_and_names() {
  let env = TestEnv::sample_project();
  env.write_file("engine/src/platform/windows/window.c", "win32 window");
  env.write_file("engine/src/platform/linux/window.c", "FAIL linux only");

  env
    .kiln_cmd()
    .args(["target", "engine", "debug", "windows"])
    .assert()
    .success()
    .stdout(predicate::str::contains(" + Compile engine/src/platform/windows/window.c"))
    .stdout(predicate::str::contains("platform/linux").not());

  assert!(env.path("bin/engine.dll").exists());
}

#[test]
fn unknown_target_in_project_config() {
  let env = TestEnv::sample_project();

  env
    .kiln_cmd()
    .args(["target", "docs", "debug", "linux"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("Error: No target 'docs' found. Aborted."));

  assert!(!env.path("bin").exists());
}
