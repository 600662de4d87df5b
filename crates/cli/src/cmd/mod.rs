mod build;
mod clean;
mod help;
mod target;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use help::cmd_help;
pub use target::cmd_target;
