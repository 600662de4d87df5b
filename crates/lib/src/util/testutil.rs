//! Test utilities for kiln-lib.
//!
//! Cross-platform shell helpers plus a scriptable fake compiler, so batch and
//! orchestration tests never need a real toolchain.

use std::path::{Path, PathBuf};

use crate::execute::cmd::ToolCommand;

/// A command running `script` through the platform shell.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> ToolCommand {
  ToolCommand::new("/bin/sh").args(["-c", script])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> ToolCommand {
  ToolCommand::new("cmd.exe").args(["/C", script])
}

/// Write an executable POSIX script at `dir/name` and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
  let mut perms = std::fs::metadata(&path).unwrap().permissions();
  perms.set_mode(0o755);
  std::fs::set_permissions(&path, perms).unwrap();
  path
}

/// A fake C driver accepting `-c <src> -o <out>` anywhere in its arguments.
///
/// Compiling copies the source to the output, fails with status 1 when the
/// source contains the word `FAIL`, and appends the source path to
/// `dir/calls.log`. Without `-c` it links: every `.o` argument is
/// concatenated into the `-o` output and `link <out>` is appended to
/// `dir/links.log`; the link fails when an object contains `UNRESOLVED`.
/// Unknown flags are ignored, so it also stands in for a shader compiler.
#[cfg(unix)]
pub fn fake_compiler(dir: &Path) -> PathBuf {
  let calls = dir.join("calls.log");
  let links = dir.join("links.log");
  write_script(
    dir,
    "fake-cc",
    &format!(
      r#"src=""; out=""; objs=""
while [ $# -gt 0 ]; do
  case "$1" in
    -c) src="$2"; shift ;;
    -o) out="$2"; shift ;;
    *.o) objs="$objs $1" ;;
  esac
  shift
done
if [ -z "$src" ]; then
  echo "link $out" >> "{links}"
  if grep -q UNRESOLVED $objs /dev/null; then echo "undefined reference to UNRESOLVED" >&2; exit 1; fi
  cat $objs /dev/null > "$out"
  exit 0
fi
echo "$src" >> "{calls}"
if grep -q FAIL "$src"; then echo "$src: error: FAIL found" >&2; exit 1; fi
cp "$src" "$out""#,
      calls = calls.display(),
      links = links.display()
    ),
  )
}

/// Lines of a fake tool log, empty when the tool never ran.
pub fn read_log(path: &Path) -> Vec<String> {
  std::fs::read_to_string(path)
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}
