//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Fake C driver: copies `-c` sources to their `-o` output and fails on
/// sources containing `FAIL`; without `-c` it concatenates the `.o`
/// arguments into the output, failing when one contains `UNRESOLVED`.
/// Every call is logged next to the script.
const FAKE_CC: &str = r#"#!/bin/sh
dir=$(dirname "$0")
src=""; out=""; objs=""
while [ $# -gt 0 ]; do
  case "$1" in
    -c) src="$2"; shift ;;
    -o) out="$2"; shift ;;
    *.o) objs="$objs $1" ;;
  esac
  shift
done
if [ -z "$src" ]; then
  echo "$out" >> "$dir/links.log"
  if grep -q UNRESOLVED $objs /dev/null; then echo "ld: undefined reference to 'vk_init'" >&2; exit 1; fi
  cat $objs /dev/null > "$out"
  exit 0
fi
echo "$src" >> "$dir/calls.log"
if grep -q FAIL "$src"; then echo "$src:1: error: FAIL found" >&2; exit 1; fi
cp "$src" "$out"
"#;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated project directory.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create a project from a fixture config.
  ///
  /// `@TOOLS@` in the fixture is replaced by the directory holding the fake
  /// toolchain.
  pub fn from_fixture(name: &str) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    let tools = env.tools_dir();
    std::fs::create_dir_all(&tools).unwrap();
    write_executable(&tools.join("fake-cc"), FAKE_CC);

    let content = fixture_content(name).replace("@TOOLS@", &tools.display().to_string());
    env.write_file("kiln.toml", &content);
    env
  }

  /// A project with an engine, a test app and two shaders.
  pub fn sample_project() -> Self {
    let env = Self::from_fixture("project.toml");
    env.write_file("engine/src/core.c", "core");
    env.write_file("engine/src/platform/linux/window.c", "linux window");
    env.write_file("engine/src/platform/windows/window.c", "FAIL windows only");
    env.write_file("testapp/src/main.c", "main");
    env.write_file("assets/shaders/basic.vert", "vert");
    env.write_file("assets/shaders/basic.frag", "frag");
    env
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Move a file's modification time a minute into the future.
  pub fn touch(&self, relative_path: &str) {
    std::fs::File::options()
      .write(true)
      .open(self.path(relative_path))
      .unwrap()
      .set_modified(SystemTime::now() + Duration::from_secs(60))
      .unwrap();
  }

  pub fn tools_dir(&self) -> PathBuf {
    self.path("tools")
  }

  /// Sources the fake compiler was invoked on, in call order.
  pub fn compile_calls(&self) -> Vec<String> {
    read_lines(&self.tools_dir().join("calls.log"))
  }

  /// Outputs the fake compiler linked, in call order.
  pub fn link_calls(&self) -> Vec<String> {
    read_lines(&self.tools_dir().join("links.log"))
  }

  /// Get a Command for the kiln binary running at the project root.
  ///
  /// Clears the environment overrides so the fixture config is used as is.
  pub fn kiln_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("kiln");
    cmd.current_dir(self.temp.path());
    cmd.env_remove("KILN_JOBS");
    cmd.env_remove("KILN_CC");
    cmd.env_remove("KILN_SHADER_COMPILER");
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

fn read_lines(path: &Path) -> Vec<String> {
  std::fs::read_to_string(path)
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}

fn write_executable(path: &Path, content: &str) {
  use std::os::unix::fs::PermissionsExt;

  std::fs::write(path, content).unwrap();
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}
