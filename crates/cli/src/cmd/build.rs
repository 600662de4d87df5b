//! Implementation of the `kiln debug` and `kiln release` commands.
//!
//! Both build every configured target for the host system; they differ only
//! in the build profile. The `target` command shares [`run_build`].

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::info;

use kiln_lib::orchestrate::{BuildError, BuildOptions, BuildOrchestrator};
use kiln_lib::platform::os::host_os_name;
use kiln_lib::platform::{BuildProfile, System, UnknownTargetError};
use kiln_lib::preflight::PreflightError;

use crate::output::{TerminalReporter, print_error, print_success};

pub fn cmd_build(project_dir: &Path, profile: BuildProfile, jobs: Option<usize>) -> Result<()> {
  let system = System::current().ok_or_else(|| UnknownTargetError::System(host_os_name().to_string()))?;
  let options = BuildOptions {
    jobs,
    ..BuildOptions::new(profile, system)
  };
  run_build(project_dir, &options)
}

/// Run one build, aborting it on Ctrl-C.
///
/// Dropping the build future drops every in-flight compile, which kills its
/// child process.
pub(crate) fn run_build(project_dir: &Path, options: &BuildOptions) -> Result<()> {
  let start = Instant::now();
  let orchestrator = BuildOrchestrator::load(project_dir)?;
  let reporter = TerminalReporter::new(orchestrator.root());

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let outcome = rt.block_on(async {
    tokio::select! {
      result = orchestrator.run(options, &reporter) => Some(result),
      _ = tokio::signal::ctrl_c() => None,
    }
  });

  let report = match outcome {
    None => bail!("Interrupted"),
    Some(Err(BuildError::Preflight(missing))) => {
      report_missing(&missing);
      bail!("Please install the missing tools and libraries before building. Aborted.");
    }
    Some(result) => result?,
  };

  info!(
    compiled = report.compiled_count(),
    elapsed_ms = start.elapsed().as_millis() as u64,
    "build finished"
  );
  print_success("Building completed successfully!");
  Ok(())
}

fn report_missing(missing: &PreflightError) {
  if !missing.tools.is_empty() {
    print_error(&format!("Missing tools: {}", missing.tools.join(", ")));
  }
  if !missing.libraries.is_empty() {
    print_error(&format!("Missing libraries: {}", missing.libraries.join(", ")));
  }
}
