//! Path helpers shared by discovery, artifact mapping and reporting.

use std::path::{Component, Path};

/// Render a path with forward slashes regardless of the host separator.
///
/// Redundant `.` components are dropped and repeated separators collapse, so
/// the result is suitable for string comparison and for shell command lines.
pub fn to_slash(path: &Path) -> String {
  let mut out = String::new();
  for component in path.components() {
    match component {
      Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy().replace('\\', "/")),
      Component::RootDir => out.push('/'),
      Component::CurDir => {}
      Component::ParentDir => push_segment(&mut out, ".."),
      Component::Normal(segment) => push_segment(&mut out, &segment.to_string_lossy()),
    }
  }
  if out.is_empty() { ".".to_string() } else { out }
}

fn push_segment(out: &mut String, segment: &str) {
  if !out.is_empty() && !out.ends_with('/') {
    out.push('/');
  }
  out.push_str(segment);
}

/// Forward-slash path of `path` relative to `base`, or the full path when
/// `path` does not live under `base`.
pub fn display_relative(path: &Path, base: &Path) -> String {
  match path.strip_prefix(base) {
    Ok(rel) => to_slash(rel),
    Err(_) => to_slash(path),
  }
}
