//! Implementation of the `kiln help` command.

use kiln_lib::consts::{APP_NAME, CONFIG_FILENAME};
use kiln_lib::platform::host_description;

/// Print usage and the host system.
pub fn cmd_help() {
  println!("Usage: {APP_NAME} [OPTIONS] <COMMAND>");
  println!();
  println!("Commands:");
  println!("  help                              Show this message");
  println!("  debug                             Build every target with debug flags");
  println!("  release                           Build every target with release flags");
  println!("  clean                             Remove the build directory");
  println!("  target <name> <build_type> <system>");
  println!("                                    Build one target for debug|release on linux|windows");
  println!();
  println!("Options:");
  println!("  -j, --jobs <N>                    Maximum number of parallel compiles");
  println!("  -C, --project-dir <DIR>           Project root holding {CONFIG_FILENAME} [default: .]");
  println!("  -v, --verbose                     Enable verbose logging");
  println!();
  println!("Current OS: {}", host_description());
}
