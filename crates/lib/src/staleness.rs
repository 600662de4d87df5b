//! Artifact freshness checks.
//!
//! The filesystem is the only cache: an artifact is fresh when it exists and
//! was modified no earlier than its source. Equal timestamps count as fresh.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
#[error("failed to read modification time of {path}")]
pub struct StaleCheckError {
  pub path: PathBuf,
  #[source]
  pub source: io::Error,
}

/// Decides whether an artifact must be rebuilt from its source.
pub trait StalenessOracle: Send + Sync {
  fn is_stale(&self, source: &Path, artifact: &Path) -> Result<bool, StaleCheckError>;
}

/// Compares filesystem modification times.
#[derive(Debug, Clone, Copy, Default)]
pub struct MtimeOracle;

impl MtimeOracle {
  fn modified(path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
  }
}

impl StalenessOracle for MtimeOracle {
  fn is_stale(&self, source: &Path, artifact: &Path) -> Result<bool, StaleCheckError> {
    let artifact_time = match Self::modified(artifact) {
      Ok(time) => time,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(artifact = %artifact.display(), "artifact missing");
        return Ok(true);
      }
      Err(source) => {
        return Err(StaleCheckError {
          path: artifact.to_path_buf(),
          source,
        });
      }
    };

    let source_time = Self::modified(source).map_err(|e| StaleCheckError {
      path: source.to_path_buf(),
      source: e,
    })?;

    let stale = artifact_time < source_time;
    debug!(source = %source.display(), artifact = %artifact.display(), stale, "compared timestamps");
    Ok(stale)
  }
}
