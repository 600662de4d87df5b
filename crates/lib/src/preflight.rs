//! Dependency presence check run before any compilation.
//!
//! Every required program must resolve on `PATH`. On linux every required
//! library must also be known to `pkg-config`. On windows the library check
//! is left to the linker.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::execute::cmd::{ToolCommand, run_tool};
use crate::platform::System;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing dependencies (tools: [{}], libraries: [{}])", .tools.join(", "), .libraries.join(", "))]
pub struct PreflightError {
  pub tools: Vec<String>,
  pub libraries: Vec<String>,
}

/// What the check verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightReport {
  pub tools_checked: usize,
  pub libraries_checked: usize,
  /// Libraries exist but could not be checked on this system.
  pub libraries_deferred: bool,
}

/// Verify every tool and library `config` needs for `system`.
pub async fn check(config: &ProjectConfig, system: System) -> Result<PreflightReport, PreflightError> {
  let tools = config.required_tools(system);
  let libraries = config.requirements(system).libraries;

  let missing_tools: Vec<String> = tools.iter().filter(|t| find_program(t).is_none()).cloned().collect();

  let mut report = PreflightReport {
    tools_checked: tools.len(),
    ..Default::default()
  };

  let mut missing_libraries = Vec::new();
  match system {
    System::Linux => {
      for lib in &libraries {
        if !pkg_config_exists(lib).await {
          missing_libraries.push(lib.clone());
        }
      }
      report.libraries_checked = libraries.len();
    }
    System::Windows => {
      report.libraries_deferred = !libraries.is_empty();
    }
  }

  if !missing_tools.is_empty() || !missing_libraries.is_empty() {
    return Err(PreflightError {
      tools: missing_tools,
      libraries: missing_libraries,
    });
  }

  info!(tools = report.tools_checked, libraries = report.libraries_checked, "dependencies present");
  Ok(report)
}

async fn pkg_config_exists(library: &str) -> bool {
  let command = ToolCommand::new("pkg-config").args(["--exists", library]);
  match run_tool(&command, None).await {
    Ok(out) => out.success,
    Err(e) => {
      debug!(library, error = %e, "pkg-config could not run");
      false
    }
  }
}

/// Resolve `name` the way a shell would.
///
/// Names containing a path separator are checked as paths; bare names are
/// searched in every `PATH` entry (with `PATHEXT` extensions on windows).
pub fn find_program(name: &str) -> Option<PathBuf> {
  let direct = Path::new(name);
  if direct.components().count() > 1 {
    return is_executable(direct).then(|| direct.to_path_buf());
  }

  let path = std::env::var_os("PATH")?;
  std::env::split_paths(&path).find_map(|dir| {
    candidates(&dir, name)
      .into_iter()
      .find(|candidate| is_executable(candidate))
  })
}

#[cfg(windows)]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
  use std::ffi::OsString;

  let pathext = std::env::var_os("PATHEXT").unwrap_or_else(|| OsString::from(".COM;.EXE;.BAT;.CMD"));
  let mut out = vec![dir.join(name)];
  for ext in pathext.to_string_lossy().split(';').filter(|e| !e.is_empty()) {
    out.push(dir.join(format!("{name}{}", ext.to_ascii_lowercase())));
  }
  out
}

#[cfg(not(windows))]
fn candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
  vec![dir.join(name)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;
  std::fs::metadata(path)
    .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}
