use std::path::Path;

use anyhow::{Context, Result};

use kiln_lib::clean::clean;
use kiln_lib::config::ProjectConfig;

use crate::output::{format_bytes, print_progress, print_stat};

pub fn cmd_clean(project_dir: &Path) -> Result<()> {
  let config = ProjectConfig::load(project_dir).context("Failed to load project configuration")?;

  print_progress("Cleaning build directory...");
  let result = clean(&project_dir.join(&config.build_dir))?;

  if result.removed {
    print_stat("Files removed", &result.files_removed.to_string());
    print_stat("Space freed", &format_bytes(result.bytes_freed));
  }

  Ok(())
}
