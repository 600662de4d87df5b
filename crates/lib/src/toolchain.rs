//! Toolchain command builders.
//!
//! The batch runner and link step are toolchain-agnostic: they receive a
//! builder and ask it for the command to run. All flag vocabulary lives here
//! and in the project configuration that feeds it.

use std::path::{Path, PathBuf};

use crate::execute::cmd::ToolCommand;
use crate::util::path::to_slash;

/// Produces the command compiling one source into one artifact.
pub trait CompileCommandBuilder: Send + Sync {
  fn compile_command(&self, source: &Path, artifact: &Path) -> ToolCommand;
}

impl<F> CompileCommandBuilder for F
where
  F: Fn(&Path, &Path) -> ToolCommand + Send + Sync,
{
  fn compile_command(&self, source: &Path, artifact: &Path) -> ToolCommand {
    self(source, artifact)
  }
}

/// Produces the command linking a set of objects into one output.
pub trait LinkCommandBuilder: Send + Sync {
  fn link_command(&self, objects: &[PathBuf], output: &Path) -> ToolCommand;
}

impl<F> LinkCommandBuilder for F
where
  F: Fn(&[PathBuf], &Path) -> ToolCommand + Send + Sync,
{
  fn link_command(&self, objects: &[PathBuf], output: &Path) -> ToolCommand {
    self(objects, output)
  }
}

/// A C compiler driver: `<cc> <flags..> -c <source> -o <object>`.
#[derive(Debug, Clone)]
pub struct CCompiler {
  pub program: String,
  pub flags: Vec<String>,
}

impl CompileCommandBuilder for CCompiler {
  fn compile_command(&self, source: &Path, artifact: &Path) -> ToolCommand {
    ToolCommand::new(&self.program)
      .args(self.flags.iter().cloned())
      .args(["-c".to_string(), to_slash(source), "-o".to_string(), to_slash(artifact)])
  }
}

/// The C driver used as linker: `<cc> <common..> <objects..> <link..> -o <output>`.
///
/// Library flags follow the objects so single-pass linkers resolve them.
#[derive(Debug, Clone)]
pub struct CLinker {
  pub program: String,
  pub common: Vec<String>,
  pub link: Vec<String>,
}

impl LinkCommandBuilder for CLinker {
  fn link_command(&self, objects: &[PathBuf], output: &Path) -> ToolCommand {
    ToolCommand::new(&self.program)
      .args(self.common.iter().cloned())
      .args(objects.iter().map(|o| to_slash(o)))
      .args(self.link.iter().cloned())
      .args(["-o".to_string(), to_slash(output)])
  }
}

/// A GLSL compiler: `<glslc> -fshader-stage=<stage> -c <source> -o <spv>`.
#[derive(Debug, Clone)]
pub struct ShaderCompiler {
  pub program: String,
  pub stage: String,
}

impl CompileCommandBuilder for ShaderCompiler {
  fn compile_command(&self, source: &Path, artifact: &Path) -> ToolCommand {
    ToolCommand::new(&self.program).args([
      format!("-fshader-stage={}", self.stage),
      "-c".to_string(),
      to_slash(source),
      "-o".to_string(),
      to_slash(artifact),
    ])
  }
}

/// Wraps a builder so it sees paths relative to `root`, the directory the
/// tools run in. Paths outside `root` pass through unchanged.
pub struct RootRelative<'a, B: ?Sized> {
  pub root: &'a Path,
  pub inner: &'a B,
}

impl<B: ?Sized> RootRelative<'_, B> {
  fn relative<'p>(&self, path: &'p Path) -> &'p Path {
    path.strip_prefix(self.root).unwrap_or(path)
  }
}

impl<B: CompileCommandBuilder + ?Sized> CompileCommandBuilder for RootRelative<'_, B> {
  fn compile_command(&self, source: &Path, artifact: &Path) -> ToolCommand {
    self.inner.compile_command(self.relative(source), self.relative(artifact))
  }
}

impl<B: LinkCommandBuilder + ?Sized> LinkCommandBuilder for RootRelative<'_, B> {
  fn link_command(&self, objects: &[PathBuf], output: &Path) -> ToolCommand {
    let objects: Vec<PathBuf> = objects.iter().map(|o| self.relative(o).to_path_buf()).collect();
    self.inner.link_command(&objects, self.relative(output))
  }
}
