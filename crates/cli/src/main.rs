mod cmd;
mod output;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kiln_lib::config::parse_jobs;
use kiln_lib::platform::{BuildProfile, UnknownTargetError};

use crate::cmd::{cmd_build, cmd_clean, cmd_help, cmd_target};
use crate::output::print_error;

/// kiln - incremental builds for native projects
#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Maximum number of parallel compiles (overrides KILN_JOBS)
  #[arg(short, long, global = true, value_parser = parse_jobs_arg)]
  jobs: Option<usize>,

  /// Project root holding kiln.toml
  #[arg(short = 'C', long, global = true, default_value = ".")]
  project_dir: PathBuf,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Show usage and the host system
  Help,

  /// Build every target with debug flags
  Debug,

  /// Build every target with release flags
  Release,

  /// Remove the build directory
  Clean,

  /// Build one target for an explicit build type and system
  Target {
    /// Target name from the project configuration
    name: String,
    /// debug or release
    build_type: String,
    /// linux or windows
    system: String,
  },

  #[command(external_subcommand)]
  Unknown(Vec<String>),
}

fn parse_jobs_arg(value: &str) -> Result<usize, String> {
  parse_jobs("--jobs", value).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(std::io::stderr().is_terminal())
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let project_dir = cli.project_dir.as_path();
  let result = match cli.command {
    None | Some(Commands::Help) => {
      cmd_help();
      Ok(())
    }
    Some(Commands::Debug) => cmd_build(project_dir, BuildProfile::Debug, cli.jobs),
    Some(Commands::Release) => cmd_build(project_dir, BuildProfile::Release, cli.jobs),
    Some(Commands::Clean) => cmd_clean(project_dir),
    Some(Commands::Target {
      name,
      build_type,
      system,
    }) => cmd_target(project_dir, &name, &build_type, &system, cli.jobs),
    Some(Commands::Unknown(args)) => {
      let name = args.first().cloned().unwrap_or_default();
      print_error(&UnknownTargetError::Command(name).to_string());
      cmd_help();
      return ExitCode::FAILURE;
    }
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}
