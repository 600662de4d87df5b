//! Build profile marker.
//!
//! Object files carry no record of the flags they were built with, so a
//! release build could otherwise link debug objects that look fresh. The
//! build directory remembers the last profile in `.profile`; switching
//! profile removes every native object tree before compiling.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::platform::BuildProfile;

const MARKER_FILENAME: &str = ".profile";

#[derive(Debug, Error)]
pub enum ProfileError {
  #[error("failed to remove {path}")]
  Remove {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write profile marker {path}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// What [`prepare`] found in the build directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSwitch {
  /// No marker yet: first build in this directory.
  Fresh,
  /// Same profile as last time.
  Unchanged,
  /// The previous build used another profile; its objects were removed.
  Switched { from: BuildProfile },
}

/// Profile recorded in `build_dir`, if any.
pub fn read_marker(build_dir: &Path) -> Option<BuildProfile> {
  std::fs::read_to_string(build_dir.join(MARKER_FILENAME))
    .ok()
    .and_then(|s| s.trim().parse().ok())
}

/// Record `profile` and drop `object_dirs` if the previous build differed.
pub fn prepare(build_dir: &Path, profile: BuildProfile, object_dirs: &[PathBuf]) -> Result<ProfileSwitch, ProfileError> {
  let switch = match read_marker(build_dir) {
    None => ProfileSwitch::Fresh,
    Some(previous) if previous == profile => ProfileSwitch::Unchanged,
    Some(previous) => {
      info!(from = %previous, to = %profile, "build profile changed, removing objects");
      for dir in object_dirs.iter().filter(|d| d.exists()) {
        std::fs::remove_dir_all(dir).map_err(|source| ProfileError::Remove {
          path: dir.clone(),
          source,
        })?;
      }
      ProfileSwitch::Switched { from: previous }
    }
  };

  if switch != ProfileSwitch::Unchanged {
    let path = build_dir.join(MARKER_FILENAME);
    std::fs::create_dir_all(build_dir)
      .and_then(|_| std::fs::write(&path, profile.as_str()))
      .map_err(|source| ProfileError::Write { path, source })?;
  }

  Ok(switch)
}
