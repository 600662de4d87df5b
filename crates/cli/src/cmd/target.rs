//! Implementation of the `kiln target` command.

use std::path::Path;

use anyhow::Result;

use kiln_lib::orchestrate::BuildOptions;
use kiln_lib::platform::{BuildProfile, System};

use super::build::run_build;

/// Build the single target `name` for an explicit profile and system.
///
/// The system is validated first so a bad value never touches the project.
pub fn cmd_target(project_dir: &Path, name: &str, build_type: &str, system: &str, jobs: Option<usize>) -> Result<()> {
  let system: System = system.parse()?;
  let profile: BuildProfile = build_type.parse()?;

  let options = BuildOptions {
    jobs,
    target: Some(name.to_string()),
    ..BuildOptions::new(profile, system)
  };
  run_build(project_dir, &options)
}
