//! Types for compile batch execution.
//!
//! This module defines the error type, the per-file and per-batch results,
//! and the configuration for running compile batches.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::artifact::MapError;
use crate::source::SourceFile;
use crate::staleness::StaleCheckError;

/// Errors that abort a batch before it can produce a result.
///
/// A compiler returning a non-zero status is not one of these: it is recorded
/// as [`CompileOutcome::Failed`] and the batch carries on.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// Artifact paths could not be derived for the batch.
  #[error("artifact mapping failed")]
  Map(#[from] MapError),

  /// Modification time of an enumerated source or artifact was unreadable.
  #[error(transparent)]
  StaleCheck(#[from] StaleCheckError),

  /// The artifact's parent directory could not be created.
  #[error("failed to create directory {path}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A tool could not be started at all.
  #[error("failed to spawn {program}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },
}

/// What happened to a single source in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
  /// The artifact was fresh; nothing ran.
  Skipped,
  /// The compiler exited successfully. `output` holds anything it printed.
  Compiled { output: String },
  /// The compiler failed. `code` is `None` when it never ran to completion.
  Failed { code: Option<i32>, output: String },
}

impl CompileOutcome {
  pub fn is_compiled(&self) -> bool {
    matches!(self, Self::Compiled { .. })
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Self::Failed { .. })
  }
}

/// Outcome of one source together with its artifact path.
#[derive(Debug, Clone)]
pub struct FileResult {
  pub source: SourceFile,
  pub artifact: PathBuf,
  pub outcome: CompileOutcome,
}

/// Summary of one batch, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
  /// Name of the source class the batch covered (e.g. `c`, `vert`).
  pub class: String,
  pub files: Vec<FileResult>,
}

impl BatchResult {
  /// True iff at least one file was compiled successfully.
  pub fn rebuilt_any(&self) -> bool {
    self.files.iter().any(|f| f.outcome.is_compiled())
  }

  /// True iff at least one file failed to compile.
  pub fn failed_any(&self) -> bool {
    self.files.iter().any(|f| f.outcome.is_failed())
  }

  /// Every artifact of the batch, whether rebuilt or reused, for link input.
  pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
    self.files.iter().map(|f| f.artifact.as_path())
  }

  pub fn compiled_count(&self) -> usize {
    self.files.iter().filter(|f| f.outcome.is_compiled()).count()
  }

  pub fn skipped_count(&self) -> usize {
    self.files.iter().filter(|f| f.outcome == CompileOutcome::Skipped).count()
  }

  pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
    self.files.iter().filter(|f| f.outcome.is_failed())
  }
}

/// Configuration for batch execution.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Maximum number of compiles running at once.
  pub jobs: usize,

  /// Working directory for spawned tools. `None` inherits the caller's.
  pub working_dir: Option<PathBuf>,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      jobs: default_jobs(),
      working_dir: None,
    }
  }
}

/// Available parallelism of the host, falling back to 4.
pub fn default_jobs() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn file(name: &str, outcome: CompileOutcome) -> FileResult {
    FileResult {
      source: SourceFile::new(format!("src/{name}.c")),
      artifact: PathBuf::from(format!("obj/{name}.o")),
      outcome,
    }
  }

  #[test]
  fn empty_batch_rebuilt_and_failed_nothing() {
    let result = BatchResult::default();
    assert!(!result.rebuilt_any());
    assert!(!result.failed_any());
    assert_eq!(result.artifacts().count(), 0);
  }

  #[test]
  fn all_skipped_is_not_a_rebuild() {
    let result = BatchResult {
      class: "c".to_string(),
      files: vec![file("a", CompileOutcome::Skipped), file("b", CompileOutcome::Skipped)],
    };
    assert!(!result.rebuilt_any());
    assert!(!result.failed_any());
    assert_eq!(result.skipped_count(), 2);
    assert_eq!(result.artifacts().count(), 2);
  }

  #[test]
  fn flags_follow_outcomes() {
    let result = BatchResult {
      class: "c".to_string(),
      files: vec![
        file("a", CompileOutcome::Compiled { output: String::new() }),
        file(
          "b",
          CompileOutcome::Failed {
            code: Some(1),
            output: "error".to_string(),
          },
        ),
        file("c", CompileOutcome::Skipped),
      ],
    };
    assert!(result.rebuilt_any());
    assert!(result.failed_any());
    assert_eq!(result.compiled_count(), 1);
    assert_eq!(result.failures().count(), 1);
  }

  #[test]
  fn failed_only_batch_did_not_rebuild() {
    let result = BatchResult {
      class: "c".to_string(),
      files: vec![file(
        "a",
        CompileOutcome::Failed {
          code: None,
          output: String::new(),
        },
      )],
    };
    assert!(!result.rebuilt_any());
    assert!(result.failed_any());
  }

  #[test]
  fn execute_config_default_jobs() {
    let config = ExecuteConfig::default();
    assert!(config.jobs >= 1);
    assert!(config.working_dir.is_none());
  }
}
