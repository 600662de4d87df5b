use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UnknownTargetError;

/// Operating systems a project can be built for.
///
/// Flag sets, output suffixes and dependency requirements are keyed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum System {
  Linux,
  Windows,
}

impl System {
  /// Detect the host system at runtime
  ///
  /// Returns `None` when the host is neither linux nor windows.
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  /// Returns the lowercase string identifier for this system
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::Windows => "windows",
    }
  }

  /// Suffix appended to executables linked for this system.
  pub fn executable_suffix(&self) -> &'static str {
    match self {
      Self::Linux => "",
      Self::Windows => ".exe",
    }
  }

  /// File name of a shared library called `name` on this system.
  pub fn shared_library_name(&self, name: &str) -> String {
    match self {
      Self::Linux => format!("lib{name}.so"),
      Self::Windows => format!("{name}.dll"),
    }
  }
}

impl fmt::Display for System {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for System {
  type Err = UnknownTargetError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "linux" => Ok(Self::Linux),
      "windows" => Ok(Self::Windows),
      other => Err(UnknownTargetError::System(other.to_string())),
    }
  }
}

/// Host OS name as the standard library reports it (e.g. "linux", "macos").
pub fn host_os_name() -> &'static str {
  std::env::consts::OS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_supported_systems() {
    assert_eq!("linux".parse::<System>().unwrap(), System::Linux);
    assert_eq!("windows".parse::<System>().unwrap(), System::Windows);
  }

  #[test]
  fn unknown_system_names_the_value() {
    let err = "amiga".parse::<System>().unwrap_err();
    assert_eq!(err.to_string(), "Unknown system named 'amiga'");
  }

  #[test]
  fn system_names_are_case_sensitive() {
    assert!("Linux".parse::<System>().is_err());
  }

  #[test]
  fn output_naming_per_system() {
    assert_eq!(System::Linux.executable_suffix(), "");
    assert_eq!(System::Windows.executable_suffix(), ".exe");
    assert_eq!(System::Linux.shared_library_name("engine"), "libengine.so");
    assert_eq!(System::Windows.shared_library_name("engine"), "engine.dll");
  }
}
