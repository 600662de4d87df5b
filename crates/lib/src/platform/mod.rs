//! Build systems, profiles and host detection.

pub mod os;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use os::System;

/// An unrecognised name supplied on the command line.
///
/// The message names the offending value so the user can correct it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnknownTargetError {
  #[error("Unknown system named '{0}'")]
  System(String),

  #[error("Unknown build type named '{0}'")]
  Profile(String),

  #[error("Unknown command '{0}'")]
  Command(String),

  #[error("No target '{0}' found. Aborted.")]
  Target(String),
}

/// Debug or release build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
  #[default]
  Debug,
  Release,
}

impl BuildProfile {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Debug => "debug",
      Self::Release => "release",
    }
  }
}

impl fmt::Display for BuildProfile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for BuildProfile {
  type Err = UnknownTargetError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "debug" => Ok(Self::Debug),
      "release" => Ok(Self::Release),
      other => Err(UnknownTargetError::Profile(other.to_string())),
    }
  }
}

/// Human readable host description for help output, e.g. "Linux (x86_64)".
pub fn host_description() -> String {
  let os = os::host_os_name();
  let mut chars = os.chars();
  let capitalized = match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  };
  format!("{} ({})", capitalized, std::env::consts::ARCH)
}
