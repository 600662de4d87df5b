//! Shared utilities.
//!
//! Path normalisation used across the crate, plus test helpers.

pub mod path;

use std::error::Error;

/// `error` followed by each of its causes, separated by `: `.
pub fn error_chain(error: &dyn Error) -> String {
  let mut text = error.to_string();
  let mut cause = error.source();
  while let Some(inner) = cause {
    text.push_str(": ");
    text.push_str(&inner.to_string());
    cause = inner.source();
  }
  text
}

#[cfg(test)]
pub mod testutil;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::execute::ExecuteError;

  #[test]
  fn error_chain_appends_every_cause() {
    let err = ExecuteError::Spawn {
      program: "cc".to_string(),
      source: std::io::Error::other("not found"),
    };
    assert_eq!(err.to_string(), "failed to spawn cc");
    assert_eq!(error_chain(&err), "failed to spawn cc: not found");
  }
}
