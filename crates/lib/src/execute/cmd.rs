//! External tool invocation.
//!
//! Tools are spawned directly (no intermediate shell) with their output
//! captured, so that concurrent compiles never interleave diagnostics and
//! the caller decides where the output is shown.

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::execute::types::ExecuteError;

/// A fully assembled tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
  pub program: String,
  pub args: Vec<String>,
}

impl ToolCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }
}

impl fmt::Display for ToolCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program)?;
    for arg in &self.args {
      write!(f, " {arg}")?;
    }
    Ok(())
  }
}

/// Captured result of a finished tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
  pub code: Option<i32>,
  pub success: bool,
  /// stdout followed by stderr, lossily decoded.
  pub output: String,
}

/// Run `command` to completion in `cwd`.
///
/// A non-zero exit is reported through [`ToolOutput::success`], not as an
/// error. The child is killed if the returned future is dropped.
pub async fn run_tool(command: &ToolCommand, cwd: Option<&Path>) -> Result<ToolOutput, ExecuteError> {
  debug!(cmd = %command, "spawning tool");

  let mut process = Command::new(&command.program);
  process
    .args(&command.args)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);
  if let Some(dir) = cwd {
    process.current_dir(dir);
  }

  let output = process.output().await.map_err(|source| ExecuteError::Spawn {
    program: command.program.clone(),
    source,
  })?;

  let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
  text.push_str(&String::from_utf8_lossy(&output.stderr));

  if !output.status.success() {
    debug!(cmd = %command, code = ?output.status.code(), "tool failed");
  }

  Ok(ToolOutput {
    code: output.status.code(),
    success: output.status.success(),
    output: text,
  })
}
