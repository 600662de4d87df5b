//! Compile execution.
//!
//! This module runs compile batches against an external toolchain:
//! - Spawning tools with captured output (`cmd`)
//! - Bounded parallel compilation with a join barrier (`batch`)
//! - Per-file and per-batch result types (`types`)

pub mod batch;
pub mod cmd;
pub mod types;

pub use batch::run_batch;
pub use cmd::{ToolCommand, ToolOutput, run_tool};
pub use types::{BatchResult, CompileOutcome, ExecuteConfig, ExecuteError, FileResult, default_jobs};
