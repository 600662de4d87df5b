//! CLI integration tests driving full builds with a fake POSIX toolchain.
#![cfg(unix)]

mod common;

#[cfg(target_os = "linux")]
mod build_tests;
#[cfg(target_os = "linux")]
mod clean_tests;
mod target_tests;
