//! Artifact path derivation.
//!
//! Every artifact path is a pure function of its source path and the mapping
//! rules of its batch: the source root prefix is rewritten to the artifact
//! root and a [`SuffixPolicy`] is applied to the file name. Results are
//! forward-slash normalised.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::source::SourceFile;
use crate::util::path::to_slash;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
  #[error("source {source_path} is not under source root {root}")]
  OutsideRoot { source_path: String, root: String },

  #[error("source {0} has no file name")]
  NoFileName(String),

  #[error("sources {first} and {second} both map to artifact {artifact}")]
  Collision {
    first: String,
    second: String,
    artifact: String,
  },
}

/// How the artifact file name is derived from the source file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuffixPolicy {
  /// Keep the full source name and append a suffix: `x.vert` -> `x.vert.spv`.
  Append(String),
  /// Replace the source extension: `b.c` -> `b.o`.
  ReplaceExtension(String),
}

/// Maps sources under `source_root` to artifacts under `artifact_root`.
#[derive(Debug, Clone)]
pub struct ArtifactPathMapper {
  source_root: PathBuf,
  artifact_root: PathBuf,
  policy: SuffixPolicy,
}

impl ArtifactPathMapper {
  pub fn new(source_root: impl Into<PathBuf>, artifact_root: impl Into<PathBuf>, policy: SuffixPolicy) -> Self {
    Self {
      source_root: source_root.into(),
      artifact_root: artifact_root.into(),
      policy,
    }
  }

  /// Native objects: `<root>/a/b.c` -> `<objects>/a/b.o`.
  pub fn objects(source_root: impl Into<PathBuf>, object_root: impl Into<PathBuf>) -> Self {
    Self::new(
      source_root,
      object_root,
      SuffixPolicy::ReplaceExtension(crate::consts::OBJECT_EXTENSION.to_string()),
    )
  }

  /// Shader bytecode written next to its source: `x.vert` -> `x.vert.spv`.
  pub fn shaders(shader_root: impl Into<PathBuf>) -> Self {
    let root = shader_root.into();
    Self::new(
      root.clone(),
      root,
      SuffixPolicy::Append(crate::consts::SHADER_ARTIFACT_SUFFIX.to_string()),
    )
  }

  pub fn artifact_root(&self) -> &Path {
    &self.artifact_root
  }

  /// Derive the artifact path for `source`.
  pub fn map_path(&self, source: &Path) -> Result<PathBuf, MapError> {
    let rel = source.strip_prefix(&self.source_root).map_err(|_| MapError::OutsideRoot {
      source_path: to_slash(source),
      root: to_slash(&self.source_root),
    })?;

    let file_name = rel
      .file_name()
      .ok_or_else(|| MapError::NoFileName(to_slash(source)))?
      .to_string_lossy();

    let artifact_name = match &self.policy {
      SuffixPolicy::Append(suffix) => format!("{file_name}{suffix}"),
      SuffixPolicy::ReplaceExtension(ext) => {
        let stem = Path::new(file_name.as_ref())
          .file_stem()
          .map(|s| s.to_string_lossy().into_owned())
          .unwrap_or_else(|| file_name.to_string());
        format!("{stem}.{ext}")
      }
    };

    let mut artifact = to_slash(&self.artifact_root);
    if let Some(parent) = rel.parent().filter(|p| !p.as_os_str().is_empty()) {
      artifact.push('/');
      artifact.push_str(&to_slash(parent));
    }
    if artifact == "." {
      artifact.clear();
    } else {
      artifact.push('/');
    }
    artifact.push_str(&artifact_name);

    Ok(PathBuf::from(artifact))
  }

  /// Map every file, failing on the first pair of sources that would share
  /// an artifact. Output order follows `files`.
  pub fn map_all(&self, files: &[SourceFile]) -> Result<Vec<PathBuf>, MapError> {
    let mut seen: HashMap<PathBuf, &SourceFile> = HashMap::with_capacity(files.len());
    let mut artifacts = Vec::with_capacity(files.len());

    for file in files {
      let artifact = self.map_path(file.path())?;
      if let Some(previous) = seen.insert(artifact.clone(), file) {
        return Err(MapError::Collision {
          first: previous.to_string(),
          second: file.to_string(),
          artifact: to_slash(&artifact),
        });
      }
      artifacts.push(artifact);
    }

    Ok(artifacts)
  }
}
