//! File-based build locking for mutual exclusion.
//!
//! Two orchestrator runs in one project would race on the same object files,
//! so every run holds an exclusive lock on `<build_dir>/.lock` until it ends.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const LOCK_FILENAME: &str = ".lock";

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub build_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum BuildLockError {
  #[error(
    "Build directory is locked by another process: {command} (PID {pid}, started {started_at})\n\
             If you're sure no kiln process is running, remove the lock file:\n  {lock_path}"
  )]
  Contention {
    command: String,
    pid: u32,
    started_at: String,
    lock_path: PathBuf,
  },

  #[error(
    "Build directory is locked (could not read lock metadata)\n\
             If you're sure no kiln process is running, remove the lock file:\n  {lock_path}"
  )]
  ContentionUnknown { lock_path: PathBuf },

  #[error("Failed to create build directory")]
  CreateDir(#[source] io::Error),

  #[error("Failed to open lock file")]
  OpenFile(#[source] io::Error),

  #[error("Failed to write lock metadata")]
  WriteMetadata(#[source] io::Error),

  #[error("Failed to acquire lock")]
  LockFailed(#[source] io::Error),
}

/// An exclusive lock on a build directory, released on drop.
pub struct BuildLock {
  file: File,
  lock_path: PathBuf,
}

impl BuildLock {
  /// Lock `build_dir`, creating it if needed. Fails immediately when another
  /// process holds the lock.
  pub fn acquire(build_dir: &Path, command: &str) -> Result<Self, BuildLockError> {
    let lock_path = build_dir.join(LOCK_FILENAME);

    if !build_dir.exists() {
      std::fs::create_dir_all(build_dir).map_err(BuildLockError::CreateDir)?;
    }

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(BuildLockError::OpenFile)?;

    if let Err(err) = try_lock(&file) {
      if err.kind() == io::ErrorKind::WouldBlock {
        return Err(Self::read_contention_error(&lock_path));
      }
      return Err(BuildLockError::LockFailed(err));
    }

    Self::write_metadata(&file, command, build_dir)?;
    debug!(path = %lock_path.display(), "build lock acquired");

    Ok(BuildLock { file, lock_path })
  }

  /// Reads the lock metadata from the held file handle.
  ///
  /// Opening a second handle would fail on windows, where locks are
  /// mandatory.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    use std::io::{Seek, SeekFrom};

    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  fn write_metadata(file: &File, command: &str, build_dir: &Path) -> Result<(), BuildLockError> {
    let metadata = LockMetadata {
      version: 1,
      pid: std::process::id(),
      started_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
      command: command.to_string(),
      build_dir: dunce::canonicalize(build_dir).unwrap_or_else(|_| build_dir.to_path_buf()),
    };

    file.set_len(0).map_err(BuildLockError::WriteMetadata)?;
    let mut writer = io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &metadata)
      .map_err(|e| BuildLockError::WriteMetadata(io::Error::other(e)))?;
    writer.flush().map_err(BuildLockError::WriteMetadata)?;

    Ok(())
  }

  fn read_contention_error(lock_path: &Path) -> BuildLockError {
    if let Ok(mut file) = File::open(lock_path) {
      let mut contents = String::new();
      if file.read_to_string(&mut contents).is_ok()
        && let Ok(metadata) = serde_json::from_str::<LockMetadata>(&contents)
      {
        let started_at = format!("Unix timestamp {}", metadata.started_at_unix);

        return BuildLockError::Contention {
          command: metadata.command,
          pid: metadata.pid,
          started_at,
          lock_path: lock_path.to_path_buf(),
        };
      }
    }

    BuildLockError::ContentionUnknown {
      lock_path: lock_path.to_path_buf(),
    }
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  flock(file.as_fd(), FlockOperation::NonBlockingLockExclusive)
    .map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn try_lock(file: &File) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(
      handle,
      LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK,
      0,
      1,
      0,
      &mut overlapped,
    )
  };

  if result == 0 {
    Err(io::Error::last_os_error())
  } else {
    Ok(())
  }
}
