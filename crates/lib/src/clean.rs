use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use walkdir::WalkDir;

use crate::build_lock::{BuildLock, BuildLockError};

#[derive(Debug, Error)]
pub enum CleanError {
  #[error(transparent)]
  Locked(#[from] BuildLockError),

  #[error("failed to delete {path}")]
  Delete {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

#[derive(Debug)]
pub struct CleanResult {
  pub build_dir: PathBuf,
  pub removed: bool,
  pub files_removed: usize,
  pub bytes_freed: u64,
}

fn dir_stats(path: &Path) -> (usize, u64) {
  WalkDir::new(path)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .filter_map(|e| e.metadata().ok())
    .fold((0, 0), |(count, bytes), m| (count + 1, bytes + m.len()))
}

/// Remove `build_dir` and everything in it.
///
/// Refuses while another run holds the build lock. Artifacts written outside
/// the build directory (shader bytecode beside its sources) are kept.
pub fn clean(build_dir: &Path) -> Result<CleanResult, CleanError> {
  if !build_dir.exists() {
    return Ok(CleanResult {
      build_dir: build_dir.to_path_buf(),
      removed: false,
      files_removed: 0,
      bytes_freed: 0,
    });
  }

  // Only checks that no build is running; the lock file goes with the directory.
  drop(BuildLock::acquire(build_dir, "clean")?);

  let (files_removed, bytes_freed) = dir_stats(build_dir);
  std::fs::remove_dir_all(build_dir).map_err(|source| CleanError::Delete {
    path: build_dir.to_path_buf(),
    source,
  })?;

  info!(path = %build_dir.display(), files_removed, bytes_freed, "build directory removed");

  Ok(CleanResult {
    build_dir: build_dir.to_path_buf(),
    removed: true,
    files_removed,
    bytes_freed,
  })
}
