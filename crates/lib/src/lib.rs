//! kiln-lib: incremental build orchestration for native projects
//!
//! This crate drives an external toolchain over a source tree:
//! - `source`: enumerating the sources of one class into a `BuildBatch`
//! - `staleness` and `artifact`: deciding which artifacts are out of date
//! - `execute`: compiling stale sources on a bounded worker pool
//! - `link`: gating and running the link step
//! - `orchestrate`: sequencing targets into one build
//!
//! The filesystem is the only cache: nothing but timestamps and artifact
//! bytes survives between runs.

pub mod artifact;
pub mod build_lock;
pub mod clean;
pub mod config;
pub mod consts;
pub mod execute;
pub mod link;
pub mod orchestrate;
pub mod platform;
pub mod preflight;
pub mod profile;
pub mod source;
pub mod staleness;
pub mod toolchain;
pub mod util;
