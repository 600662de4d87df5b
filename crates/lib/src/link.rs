//! Link gate and link step.
//!
//! A linked artifact is regenerated when any object of its batch was rebuilt
//! or when the artifact itself is missing. Otherwise the existing file is
//! reused untouched. A batch with failures is never linked.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::execute::cmd::run_tool;
use crate::execute::types::{BatchResult, ExecuteConfig, ExecuteError};
use crate::toolchain::LinkCommandBuilder;
use crate::util::path::to_slash;

/// Why the gate decided the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDecision {
  /// At least one object was recompiled.
  ObjectsRebuilt,
  /// Nothing was recompiled but the output does not exist yet.
  OutputMissing,
  /// All objects fresh and the output exists.
  UpToDate,
}

impl LinkDecision {
  pub fn should_link(&self) -> bool {
    !matches!(self, Self::UpToDate)
  }
}

/// Decide whether `linked` must be regenerated after `result`.
///
/// A batch with failures never links, so it is reported as `UpToDate`.
pub fn decide(result: &BatchResult, linked: &Path) -> LinkDecision {
  let decision = if result.failed_any() {
    LinkDecision::UpToDate
  } else if result.rebuilt_any() {
    LinkDecision::ObjectsRebuilt
  } else if !linked.exists() {
    LinkDecision::OutputMissing
  } else {
    LinkDecision::UpToDate
  };

  debug!(output = %linked.display(), ?decision, "link gate");
  decision
}

/// Shorthand for `decide(result, linked).should_link()`.
pub fn should_link(result: &BatchResult, linked: &Path) -> bool {
  decide(result, linked).should_link()
}

#[derive(Debug, Error)]
pub enum LinkError {
  #[error("failed to link {output} ({})", exit_status(.code))]
  Failed {
    output: String,
    code: Option<i32>,
    /// Everything the linker printed.
    log: String,
  },

  #[error("failed to create directory {path}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Execute(#[from] ExecuteError),
}

fn exit_status(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {code}"),
    None => "terminated by a signal".to_string(),
  }
}

/// Link every artifact of `result` into `output`.
///
/// Returns the linker's output on success.
pub async fn link(
  builder: &dyn LinkCommandBuilder,
  result: &BatchResult,
  output: &Path,
  config: &ExecuteConfig,
) -> Result<String, LinkError> {
  if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).map_err(|source| LinkError::CreateDir {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  let objects: Vec<PathBuf> = result.artifacts().map(Path::to_path_buf).collect();
  let command = builder.link_command(&objects, output);
  info!(output = %output.display(), objects = objects.len(), "linking");

  let out = run_tool(&command, config.working_dir.as_deref()).await?;
  if !out.success {
    return Err(LinkError::Failed {
      output: to_slash(output),
      code: out.code,
      log: out.output,
    });
  }

  Ok(out.output)
}
