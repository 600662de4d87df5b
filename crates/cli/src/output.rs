//! CLI output formatting utilities.
//!
//! Progress and per-file lines go to stdout, errors to stderr. Colors are
//! applied only when the stream supports them.

use std::path::{Path, PathBuf};

use owo_colors::{OwoColorize, Stream};

use kiln_lib::execute::{BatchResult, CompileOutcome};
use kiln_lib::orchestrate::{BuildEvent, Reporter, StepSummary};
use kiln_lib::util::path::display_relative;

pub mod symbols {
  pub const COMPILE: &str = "+";
  pub const EXISTS: &str = "!";
  pub const FAILED: &str = "x";
  pub const SUMMARY: &str = "=";
}

pub fn format_bytes(bytes: u64) -> String {
  const KB: u64 = 1024;
  const MB: u64 = KB * 1024;
  const GB: u64 = MB * 1024;

  if bytes >= GB {
    format!("{:.1} GB", bytes as f64 / GB as f64)
  } else if bytes >= MB {
    format!("{:.1} MB", bytes as f64 / MB as f64)
  } else if bytes >= KB {
    format!("{:.1} KB", bytes as f64 / KB as f64)
  } else {
    format!("{} B", bytes)
  }
}

/// Top-level progress line, e.g. `Building engine...`.
pub fn print_progress(message: &str) {
  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.bold()));
}

/// Indented ` ! <message>` line.
pub fn print_notice(message: &str) {
  println!(
    " {} {}",
    symbols::EXISTS.if_supports_color(Stream::Stdout, |s| s.yellow()),
    message
  );
}

pub fn print_success(message: &str) {
  println!("{}", message.if_supports_color(Stream::Stdout, |s| s.green()));
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    "Error:".if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// Tool output replayed verbatim below the line of the file that produced it.
fn print_tool_output(output: &str) {
  let output = output.trim_end();
  if !output.is_empty() {
    println!("{output}");
  }
}

fn print_summary(summary: StepSummary) {
  let text = summary.to_string();
  let colored = match summary {
    StepSummary::NoChanges => text.if_supports_color(Stream::Stdout, |s| s.dimmed()).to_string(),
    StepSummary::Updated | StepSummary::Assembled => text.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
  };
  println!(" {} {}", symbols::SUMMARY, colored);
}

/// Renders build progress for a project rooted at `root`.
pub struct TerminalReporter {
  root: PathBuf,
}

impl TerminalReporter {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn relative(&self, path: &Path) -> String {
    display_relative(path, &self.root)
  }

  fn print_batch(&self, result: &BatchResult) {
    for file in &result.files {
      match &file.outcome {
        CompileOutcome::Skipped => print_notice(&format!("Already exists {}", self.relative(&file.artifact))),
        CompileOutcome::Compiled { output } => {
          println!(
            " {} Compile {}",
            symbols::COMPILE.if_supports_color(Stream::Stdout, |s| s.green()),
            self.relative(file.source.path())
          );
          print_tool_output(output);
        }
        CompileOutcome::Failed { output, .. } => {
          println!(
            " {} Failed {}",
            symbols::FAILED.if_supports_color(Stream::Stdout, |s| s.red()),
            self.relative(file.source.path())
          );
          print_tool_output(output);
        }
      }
    }
  }
}

impl Reporter for TerminalReporter {
  fn report(&self, event: BuildEvent<'_>) {
    match event {
      BuildEvent::CheckingDependencies => print_progress("Checking dependencies..."),
      BuildEvent::LibraryCheckDeferred => print_notice("Library check on Windows will be done during compilation."),
      BuildEvent::CreatingBuildDir => print_progress("Creating build directory..."),
      BuildEvent::ProfileSwitched { from, to } => {
        print_notice(&format!("Build type changed from {from} to {to}, removing objects"))
      }
      BuildEvent::TargetStarted { name } => print_progress(&format!("Building {name}...")),
      BuildEvent::BatchFinished { result, .. } => self.print_batch(result),
      BuildEvent::LinkFinished { log, .. } => print_tool_output(log),
      BuildEvent::StepFinished { summary, .. } => print_summary(summary),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_bytes() {
    assert_eq!(format_bytes(500), "500 B");
    assert_eq!(format_bytes(1024), "1.0 KB");
    assert_eq!(format_bytes(1536), "1.5 KB");
    assert_eq!(format_bytes(1048576), "1.0 MB");
    assert_eq!(format_bytes(1073741824), "1.0 GB");
  }

  #[test]
  fn reporter_paths_are_project_relative() {
    let reporter = TerminalReporter::new("/work/game");
    assert_eq!(
      reporter.relative(Path::new("/work/game/bin/objs/engine/core.o")),
      "bin/objs/engine/core.o"
    );
    assert_eq!(reporter.relative(Path::new("/elsewhere/x.c")), "/elsewhere/x.c");
  }
}
