//! Source enumeration.
//!
//! A [`BuildBatch`] is the set of sources of one [`SourceClass`] found under a
//! root directory when the run starts. Discovery walks the tree once; files
//! appearing later in the run are not observed.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::util::path::to_slash;

#[derive(Debug, Error)]
pub enum DiscoverError {
  #[error("failed to walk {root}")]
  Walk {
    root: PathBuf,
    #[source]
    source: walkdir::Error,
  },
}

/// A class of sources sharing a file extension (e.g. `c`, `vert`, `frag`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceClass {
  name: String,
  extensions: Vec<String>,
}

impl SourceClass {
  /// Class matching a single extension, named after it.
  pub fn new(extension: &str) -> Self {
    Self {
      name: extension.to_string(),
      extensions: vec![extension.to_string()],
    }
  }

  /// Class matching several extensions under one name.
  pub fn with_extensions(name: &str, extensions: &[&str]) -> Self {
    Self {
      name: name.to_string(),
      extensions: extensions.iter().map(|e| e.to_string()).collect(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn extensions(&self) -> &[String] {
    &self.extensions
  }

  /// True when `path` carries one of this class's extensions.
  pub fn matches(&self, path: &Path) -> bool {
    path
      .extension()
      .map(|ext| self.extensions.iter().any(|e| ext == e.as_str()))
      .unwrap_or(false)
  }
}

impl fmt::Display for SourceClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// One translation unit or shader source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
  path: PathBuf,
}

impl SourceFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl fmt::Display for SourceFile {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", to_slash(&self.path))
  }
}

/// All sources of one class under `root`, in a stable order.
#[derive(Debug, Clone)]
pub struct BuildBatch {
  class: SourceClass,
  root: PathBuf,
  files: Vec<SourceFile>,
}

impl BuildBatch {
  /// Assemble a batch from already-known files.
  pub fn new(class: SourceClass, root: impl Into<PathBuf>, files: Vec<SourceFile>) -> Self {
    Self {
      class,
      root: root.into(),
      files,
    }
  }

  /// Enumerate every file of `class` below `root`.
  ///
  /// Entries are visited in file-name order so logs are reproducible across
  /// runs. Any path whose root-relative form starts with one of `exclude`
  /// is skipped together with everything beneath it. A missing root yields
  /// an empty batch.
  pub fn discover(root: &Path, class: SourceClass, exclude: &[PathBuf]) -> Result<Self, DiscoverError> {
    if !root.exists() {
      warn!(root = %root.display(), class = %class, "source root does not exist");
      return Ok(Self::new(class, root, Vec::new()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| !is_excluded(entry.path(), root, exclude));

    for entry in walker {
      let entry = entry.map_err(|source| DiscoverError::Walk {
        root: root.to_path_buf(),
        source,
      })?;
      if entry.file_type().is_file() && class.matches(entry.path()) {
        files.push(SourceFile::new(entry.into_path()));
      }
    }

    debug!(root = %root.display(), class = %class, count = files.len(), "discovered sources");
    Ok(Self::new(class, root, files))
  }

  pub fn class(&self) -> &SourceClass {
    &self.class
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn files(&self) -> &[SourceFile] {
    &self.files
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

fn is_excluded(path: &Path, root: &Path, exclude: &[PathBuf]) -> bool {
  match path.strip_prefix(root) {
    Ok(rel) if !rel.as_os_str().is_empty() => exclude.iter().any(|ex| rel.starts_with(ex)),
    _ => false,
  }
}
