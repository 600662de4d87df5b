use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_removes_build_dir_and_keeps_shader_bytecode() {
  let env = TestEnv::sample_project();
  env.kiln_cmd().arg("debug").assert().success();

  env
    .kiln_cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Cleaning build directory..."))
    .stdout(predicate::str::contains("Space freed"));

  assert!(!env.path("bin").exists());
  assert!(env.path("assets/shaders/basic.vert.spv").exists());
}

#[test]
fn build_after_clean_recompiles_native_sources() {
  let env = TestEnv::sample_project();
  env.kiln_cmd().arg("debug").assert().success();
  env.kiln_cmd().arg("clean").assert().success();

  env
    .kiln_cmd()
    .arg("debug")
    .assert()
    .success()
    .stdout(predicate::str::contains(" + Compile engine/src/core.c"))
    .stdout(predicate::str::contains(" = Assembled"));

  assert_eq!(env.compile_calls().len(), 8);
}
