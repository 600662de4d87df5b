//! Project configuration.
//!
//! A project is described by an optional `kiln.toml` at its root. Any key the
//! file leaves out falls back to the built-in defaults, which describe the
//! classic layout: an `engine` shared library, a `testapp` executable linked
//! against it, and an `assets` shader bundle. A few environment variables
//! override the file (see [`crate::consts`]).

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CC_ENV, CONFIG_FILENAME, DEFAULT_BUILD_DIR, JOBS_ENV, OBJECTS_DIR, SHADER_COMPILER_ENV};
use crate::platform::{BuildProfile, System};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value '{value}' for {var}: expected a positive integer")]
  InvalidEnv { var: &'static str, value: String },

  #[error("invalid configuration: {0}")]
  Invalid(String),
}

/// Kind of product a target builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
  /// Native sources linked into an executable.
  Executable,
  /// Native sources linked into a shared library.
  SharedLibrary,
  /// Shader sources compiled stage by stage; nothing is linked.
  Shaders,
}

impl TargetKind {
  pub fn is_native(&self) -> bool {
    !matches!(self, Self::Shaders)
  }
}

/// External programs driving compilation and linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
  /// C compiler, also used as the link driver.
  pub cc: String,
  pub shader_compiler: String,
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    Self {
      cc: "clang".to_string(),
      shader_compiler: "glslc".to_string(),
    }
  }
}

/// Tools and libraries that must be present before a build starts, on top of
/// the configured toolchain programs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Requirements {
  pub tools: Vec<String>,
  pub libraries: Vec<String>,
}

/// Flags and source exclusions of one target on one system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformSettings {
  /// Passed to both compile and link commands.
  pub common: Vec<String>,
  pub compile: Vec<String>,
  pub link: Vec<String>,
  pub defines: Vec<String>,
  pub includes: Vec<String>,
  /// Subtrees of the source root not built on this system.
  pub exclude: Vec<PathBuf>,
}

/// One buildable unit of the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
  pub name: String,
  pub kind: TargetKind,
  /// Source root, relative to the project root.
  pub sources: PathBuf,
  /// Base name of the linked output. Defaults to the target name.
  #[serde(default)]
  pub output: Option<String>,
  /// Native source extensions.
  #[serde(default = "default_extensions")]
  pub extensions: Vec<String>,
  /// Shader stages, built in this order.
  #[serde(default)]
  pub stages: Vec<String>,
  /// Extra compile flags for debug builds.
  #[serde(default = "default_debug_flags")]
  pub debug: Vec<String>,
  /// Extra compile flags for release builds.
  #[serde(default = "default_release_flags")]
  pub release: Vec<String>,
  #[serde(default)]
  pub linux: PlatformSettings,
  #[serde(default)]
  pub windows: PlatformSettings,
}

fn default_extensions() -> Vec<String> {
  vec!["c".to_string()]
}

fn default_debug_flags() -> Vec<String> {
  strings(&["-g", "-DDEBUG_FLAG"])
}

fn default_release_flags() -> Vec<String> {
  strings(&["-O2"])
}

fn strings(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}

impl TargetConfig {
  pub fn platform(&self, system: System) -> &PlatformSettings {
    match system {
      System::Linux => &self.linux,
      System::Windows => &self.windows,
    }
  }

  fn output_base(&self) -> &str {
    self.output.as_deref().unwrap_or(&self.name)
  }

  /// Final linked file for `system`, or `None` for shader targets.
  pub fn output_path(&self, build_dir: &Path, system: System) -> Option<PathBuf> {
    match self.kind {
      TargetKind::Executable => Some(build_dir.join(format!("{}{}", self.output_base(), system.executable_suffix()))),
      TargetKind::SharedLibrary => Some(build_dir.join(system.shared_library_name(self.output_base()))),
      TargetKind::Shaders => None,
    }
  }

  /// Directory mirroring the source tree with object files.
  pub fn object_dir(&self, build_dir: &Path) -> PathBuf {
    build_dir.join(OBJECTS_DIR).join(&self.name)
  }

  /// Every flag passed when compiling one native source.
  pub fn compile_flags(&self, system: System, profile: BuildProfile) -> Vec<String> {
    let platform = self.platform(system);
    let profile_flags = match profile {
      BuildProfile::Debug => &self.debug,
      BuildProfile::Release => &self.release,
    };
    platform
      .common
      .iter()
      .chain(&platform.compile)
      .chain(profile_flags)
      .chain(&platform.defines)
      .chain(&platform.includes)
      .cloned()
      .collect()
  }
}

/// Whole-project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
  /// Build directory, relative to the project root.
  pub build_dir: PathBuf,
  /// Compile worker pool size. `None` uses the host's available parallelism.
  pub jobs: Option<usize>,
  pub toolchain: ToolchainConfig,
  pub requirements: BTreeMap<System, Requirements>,
  #[serde(rename = "target")]
  pub targets: Vec<TargetConfig>,
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
      jobs: None,
      toolchain: ToolchainConfig::default(),
      requirements: default_requirements(),
      targets: default_targets(),
    }
  }
}

fn default_requirements() -> BTreeMap<System, Requirements> {
  let mut map = BTreeMap::new();
  map.insert(
    System::Linux,
    Requirements {
      tools: strings(&["pkg-config", "wayland-scanner"]),
      libraries: strings(&["wayland-client", "xcb", "xkbcommon", "vulkan"]),
    },
  );
  map.insert(
    System::Windows,
    Requirements {
      tools: Vec::new(),
      libraries: strings(&["user32", "gdi32", "winmm", "vulkan-1"]),
    },
  );
  map
}

const WARNINGS: &[&str] = &["-Wall", "-Wextra", "-Werror", "-Wvla", "-Wreturn-type"];

fn default_targets() -> Vec<TargetConfig> {
  let warnings = strings(WARNINGS);
  let hidden_and_warnings: Vec<String> = std::iter::once("-fvisibility=hidden".to_string())
    .chain(warnings.iter().cloned())
    .collect();

  let engine = TargetConfig {
    name: "engine".to_string(),
    kind: TargetKind::SharedLibrary,
    sources: PathBuf::from("engine/src"),
    output: None,
    extensions: default_extensions(),
    stages: Vec::new(),
    debug: default_debug_flags(),
    release: default_release_flags(),
    linux: PlatformSettings {
      common: strings(&["-fPIC"]),
      compile: hidden_and_warnings.clone(),
      link: strings(&["-shared", "-lwayland-client", "-lxcb", "-lxkbcommon", "-lvulkan", "-lm"]),
      defines: strings(&["-DLIB_EXPORT_FLAG"]),
      includes: strings(&["-Iengine/src"]),
      exclude: vec![PathBuf::from("platform/windows")],
    },
    windows: PlatformSettings {
      common: strings(&["-fdeclspec"]),
      compile: warnings.clone(),
      link: strings(&["-shared", "-luser32", "-lgdi32", "-lwinmm", "-lvulkan-1"]),
      defines: strings(&["-DLIB_EXPORT_FLAG"]),
      includes: strings(&["-Iengine/src"]),
      exclude: vec![PathBuf::from("platform/linux")],
    },
  };

  let testapp = TargetConfig {
    name: "testapp".to_string(),
    kind: TargetKind::Executable,
    sources: PathBuf::from("testapp/src"),
    output: None,
    extensions: default_extensions(),
    stages: Vec::new(),
    debug: default_debug_flags(),
    release: default_release_flags(),
    linux: PlatformSettings {
      common: strings(&["-fPIE"]),
      compile: hidden_and_warnings,
      link: strings(&["-Lbin", "-lengine", "-Wl,-rpath,."]),
      defines: Vec::new(),
      includes: strings(&["-Itestapp/src", "-Iengine/src"]),
      exclude: Vec::new(),
    },
    windows: PlatformSettings {
      common: strings(&["-fdeclspec"]),
      compile: warnings,
      link: strings(&["-Lbin", "-lengine", "-Wl,/entry:mainCRTStartup,/subsystem:windows"]),
      defines: Vec::new(),
      includes: strings(&["-Itestapp/src", "-Iengine/src"]),
      exclude: Vec::new(),
    },
  };

  let shaders = TargetConfig {
    name: "shaders".to_string(),
    kind: TargetKind::Shaders,
    sources: PathBuf::from("assets/shaders"),
    output: None,
    extensions: Vec::new(),
    stages: strings(&["vert", "frag"]),
    debug: Vec::new(),
    release: Vec::new(),
    linux: PlatformSettings::default(),
    windows: PlatformSettings::default(),
  };

  vec![engine, testapp, shaders]
}

impl ProjectConfig {
  /// Load the configuration of the project rooted at `root`.
  ///
  /// Reads `kiln.toml` when present, applies environment overrides and
  /// validates the result.
  pub fn load(root: &Path) -> Result<Self, ConfigError> {
    let path = root.join(CONFIG_FILENAME);
    let mut config = if path.exists() {
      debug!(path = %path.display(), "loading project config");
      let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
      })?;
      Self::from_toml(&content).map_err(|source| ConfigError::Parse { path, source })?
    } else {
      debug!(root = %root.display(), "no project config, using defaults");
      Self::default()
    };

    config.apply_env()?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  fn apply_env(&mut self) -> Result<(), ConfigError> {
    if let Ok(cc) = std::env::var(CC_ENV)
      && !cc.is_empty()
    {
      self.toolchain.cc = cc;
    }
    if let Ok(glslc) = std::env::var(SHADER_COMPILER_ENV)
      && !glslc.is_empty()
    {
      self.toolchain.shader_compiler = glslc;
    }
    if let Ok(jobs) = std::env::var(JOBS_ENV) {
      self.jobs = Some(parse_jobs(JOBS_ENV, &jobs)?);
    }
    Ok(())
  }

  /// Check invariants a TOML schema cannot express.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.jobs == Some(0) {
      return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
    }

    let mut names = HashSet::new();
    for target in &self.targets {
      if target.name.is_empty() {
        return Err(ConfigError::Invalid("target name must not be empty".to_string()));
      }
      if !names.insert(target.name.as_str()) {
        return Err(ConfigError::Invalid(format!("duplicate target '{}'", target.name)));
      }
      match target.kind {
        TargetKind::Shaders if target.stages.is_empty() => {
          return Err(ConfigError::Invalid(format!(
            "shader target '{}' declares no stages",
            target.name
          )));
        }
        TargetKind::Executable | TargetKind::SharedLibrary if target.extensions.is_empty() => {
          return Err(ConfigError::Invalid(format!(
            "target '{}' declares no source extensions",
            target.name
          )));
        }
        _ => {}
      }
    }
    Ok(())
  }

  pub fn target(&self, name: &str) -> Option<&TargetConfig> {
    self.targets.iter().find(|t| t.name == name)
  }

  pub fn requirements(&self, system: System) -> Requirements {
    self.requirements.get(&system).cloned().unwrap_or_default()
  }

  /// Every program that must resolve before building on `system`: the
  /// toolchain programs the targets actually use, then the extra tools.
  pub fn required_tools(&self, system: System) -> Vec<String> {
    let mut tools = Vec::new();
    if self.targets.iter().any(|t| t.kind.is_native()) {
      tools.push(self.toolchain.cc.clone());
    }
    if self.targets.iter().any(|t| t.kind == TargetKind::Shaders) {
      tools.push(self.toolchain.shader_compiler.clone());
    }
    for tool in self.requirements(system).tools {
      if !tools.contains(&tool) {
        tools.push(tool);
      }
    }
    tools
  }

  /// Native targets' object directories under `root`.
  pub fn object_dirs(&self, root: &Path) -> Vec<PathBuf> {
    let build_dir = root.join(&self.build_dir);
    self
      .targets
      .iter()
      .filter(|t| t.kind.is_native())
      .map(|t| t.object_dir(&build_dir))
      .collect()
  }
}

/// Parse a worker count, rejecting zero and non-numbers.
pub fn parse_jobs(var: &'static str, value: &str) -> Result<usize, ConfigError> {
  match value.trim().parse::<usize>() {
    Ok(n) if n > 0 => Ok(n),
    _ => Err(ConfigError::InvalidEnv {
      var,
      value: value.to_string(),
    }),
  }
}
