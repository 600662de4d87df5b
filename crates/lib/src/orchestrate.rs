//! Build orchestration.
//!
//! A build walks the configured targets in order. Each native target is one
//! compile batch followed by a gated link; each shader target is one batch
//! per stage. The first target that fails ends the build.
//!
//! Before any target runs the orchestrator checks dependencies, takes the
//! build lock and reconciles the profile marker.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::artifact::ArtifactPathMapper;
use crate::build_lock::{BuildLock, BuildLockError};
use crate::config::{ConfigError, ProjectConfig, TargetConfig, TargetKind};
use crate::execute::{BatchResult, ExecuteConfig, ExecuteError, default_jobs, run_batch};
use crate::link::{self, LinkDecision, LinkError};
use crate::platform::{BuildProfile, System, UnknownTargetError};
use crate::preflight::{self, PreflightError};
use crate::profile::{self, ProfileError, ProfileSwitch};
use crate::source::{BuildBatch, DiscoverError, SourceClass};
use crate::staleness::{MtimeOracle, StalenessOracle};
use crate::toolchain::{CCompiler, CLinker, CompileCommandBuilder, RootRelative, ShaderCompiler};
use crate::util::path::display_relative;

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  UnknownTarget(#[from] UnknownTargetError),

  #[error(transparent)]
  Preflight(#[from] PreflightError),

  #[error(transparent)]
  Lock(#[from] BuildLockError),

  #[error(transparent)]
  Profile(#[from] ProfileError),

  #[error("failed to enumerate sources of {target}")]
  Discover {
    target: String,
    #[source]
    source: DiscoverError,
  },

  #[error("failed to build {target}")]
  Execute {
    target: String,
    #[source]
    source: ExecuteError,
  },

  /// One or more sources failed; the target was not linked.
  #[error("failed to compile {target}: {}", .failures.join(", "))]
  CompileFailed { target: String, failures: Vec<String> },

  #[error("failed to link {target}")]
  LinkFailed {
    target: String,
    #[source]
    source: LinkError,
  },
}

/// Outcome line of one step (a batch, plus its link for native targets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSummary {
  /// Something was recompiled or relinked over an existing output.
  Updated,
  /// The linked output did not exist before this run.
  Assembled,
  NoChanges,
}

impl fmt::Display for StepSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Self::Updated => "Has been updated",
      Self::Assembled => "Assembled",
      Self::NoChanges => "No changes found",
    };
    write!(f, "{text}")
  }
}

#[derive(Debug, Clone)]
pub struct StepReport {
  pub batch: BatchResult,
  /// Link gate verdict; `None` for steps that never link.
  pub link: Option<LinkDecision>,
  pub summary: StepSummary,
}

#[derive(Debug, Clone)]
pub struct TargetReport {
  pub name: String,
  pub kind: TargetKind,
  pub steps: Vec<StepReport>,
}

impl TargetReport {
  pub fn compiled_count(&self) -> usize {
    self.steps.iter().map(|s| s.batch.compiled_count()).sum()
  }

  pub fn changed(&self) -> bool {
    self.steps.iter().any(|s| s.summary != StepSummary::NoChanges)
  }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
  pub profile: BuildProfile,
  pub system: System,
  pub profile_switch: ProfileSwitch,
  pub targets: Vec<TargetReport>,
}

impl BuildReport {
  pub fn compiled_count(&self) -> usize {
    self.targets.iter().map(TargetReport::compiled_count).sum()
  }

  pub fn changed(&self) -> bool {
    self.targets.iter().any(TargetReport::changed)
  }
}

/// Progress notifications, in the order they happen.
#[derive(Debug, Clone, Copy)]
pub enum BuildEvent<'a> {
  CheckingDependencies,
  /// Libraries could not be probed on this system; the linker will tell.
  LibraryCheckDeferred,
  CreatingBuildDir,
  ProfileSwitched { from: BuildProfile, to: BuildProfile },
  TargetStarted { name: &'a str },
  /// A batch finished; failures are included.
  BatchFinished { target: &'a str, result: &'a BatchResult },
  /// The linker ran; `log` is everything it printed, on success or failure.
  LinkFinished { target: &'a str, log: &'a str },
  StepFinished { target: &'a str, summary: StepSummary },
}

/// Receives [`BuildEvent`]s as the build progresses.
pub trait Reporter: Send + Sync {
  fn report(&self, event: BuildEvent<'_>);
}

/// Discards every event.
pub struct SilentReporter;

impl Reporter for SilentReporter {
  fn report(&self, _event: BuildEvent<'_>) {}
}

/// What to build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
  pub profile: BuildProfile,
  pub system: System,
  /// Overrides the configured worker pool size.
  pub jobs: Option<usize>,
  /// Build only this target instead of all of them.
  pub target: Option<String>,
}

impl BuildOptions {
  pub fn new(profile: BuildProfile, system: System) -> Self {
    Self {
      profile,
      system,
      jobs: None,
      target: None,
    }
  }
}

pub struct BuildOrchestrator {
  root: PathBuf,
  config: ProjectConfig,
  oracle: Box<dyn StalenessOracle>,
}

impl BuildOrchestrator {
  pub fn new(root: impl Into<PathBuf>, config: ProjectConfig) -> Self {
    Self {
      root: root.into(),
      config,
      oracle: Box::new(MtimeOracle),
    }
  }

  /// Load `kiln.toml` (or the defaults) for the project at `root`.
  ///
  /// Tools run inside the root, so it is made absolute first.
  pub fn load(root: impl Into<PathBuf>) -> Result<Self, BuildError> {
    let root = root.into();
    let root = dunce::canonicalize(&root).unwrap_or(root);
    let config = ProjectConfig::load(&root)?;
    Ok(Self::new(root, config))
  }

  pub fn with_oracle(mut self, oracle: impl StalenessOracle + 'static) -> Self {
    self.oracle = Box::new(oracle);
    self
  }

  pub fn config(&self) -> &ProjectConfig {
    &self.config
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn build_dir(&self) -> PathBuf {
    self.root.join(&self.config.build_dir)
  }

  /// Worker pool size: explicit option, then configuration, then the host.
  pub fn jobs(&self, options: &BuildOptions) -> usize {
    options.jobs.or(self.config.jobs).unwrap_or_else(default_jobs)
  }

  fn select(&self, only: Option<&str>) -> Result<Vec<&TargetConfig>, UnknownTargetError> {
    match only {
      Some(name) => self
        .config
        .target(name)
        .map(|t| vec![t])
        .ok_or_else(|| UnknownTargetError::Target(name.to_string())),
      None => Ok(self.config.targets.iter().collect()),
    }
  }

  /// Run one build.
  ///
  /// # Errors
  ///
  /// Fails before touching the filesystem on an unknown target or missing
  /// dependency. Afterwards the first failing target ends the build.
  pub async fn run(&self, options: &BuildOptions, reporter: &dyn Reporter) -> Result<BuildReport, BuildError> {
    let targets = self.select(options.target.as_deref())?;

    reporter.report(BuildEvent::CheckingDependencies);
    let checked = preflight::check(&self.config, options.system).await?;
    if checked.libraries_deferred {
      reporter.report(BuildEvent::LibraryCheckDeferred);
    }

    let build_dir = self.build_dir();
    if !build_dir.exists() {
      reporter.report(BuildEvent::CreatingBuildDir);
    }
    let _lock = BuildLock::acquire(&build_dir, options.profile.as_str())?;

    let profile_switch = profile::prepare(&build_dir, options.profile, &self.config.object_dirs(&self.root))?;
    if let ProfileSwitch::Switched { from } = profile_switch {
      reporter.report(BuildEvent::ProfileSwitched {
        from,
        to: options.profile,
      });
    }

    let exec = ExecuteConfig {
      jobs: self.jobs(options),
      working_dir: Some(self.root.clone()),
    };
    info!(
      profile = %options.profile,
      system = %options.system,
      jobs = exec.jobs,
      targets = targets.len(),
      "build started"
    );

    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
      reporter.report(BuildEvent::TargetStarted { name: &target.name });
      let report = match target.output_path(&build_dir, options.system) {
        Some(output) => self.build_native(target, &output, options, &exec, reporter).await,
        None => self.build_shaders(target, options, &exec, reporter).await,
      };
      match report {
        Ok(report) => reports.push(report),
        Err(e) => {
          debug!(target = %target.name, "target failed, stopping build");
          return Err(e);
        }
      }
    }

    let report = BuildReport {
      profile: options.profile,
      system: options.system,
      profile_switch,
      targets: reports,
    };
    info!(compiled = report.compiled_count(), changed = report.changed(), "build complete");
    Ok(report)
  }

  async fn run_step(
    &self,
    target: &TargetConfig,
    batch: &BuildBatch,
    builder: &dyn CompileCommandBuilder,
    mapper: &ArtifactPathMapper,
    exec: &ExecuteConfig,
    reporter: &dyn Reporter,
  ) -> Result<BatchResult, BuildError> {
    let builder = RootRelative {
      root: &self.root,
      inner: builder,
    };
    let result = run_batch(batch, &builder, self.oracle.as_ref(), mapper, exec)
      .await
      .map_err(|source| BuildError::Execute {
        target: target.name.clone(),
        source,
      })?;

    reporter.report(BuildEvent::BatchFinished {
      target: &target.name,
      result: &result,
    });

    if result.failed_any() {
      return Err(BuildError::CompileFailed {
        target: target.name.clone(),
        failures: result
          .failures()
          .map(|f| display_relative(f.source.path(), &self.root))
          .collect(),
      });
    }
    Ok(result)
  }

  fn discover(&self, target: &TargetConfig, class: SourceClass, system: System) -> Result<BuildBatch, BuildError> {
    BuildBatch::discover(&self.root.join(&target.sources), class, &target.platform(system).exclude).map_err(|source| {
      BuildError::Discover {
        target: target.name.clone(),
        source,
      }
    })
  }

  async fn build_native(
    &self,
    target: &TargetConfig,
    output: &Path,
    options: &BuildOptions,
    exec: &ExecuteConfig,
    reporter: &dyn Reporter,
  ) -> Result<TargetReport, BuildError> {
    let extensions: Vec<&str> = target.extensions.iter().map(String::as_str).collect();
    let class = SourceClass::with_extensions(&target.extensions.join(","), &extensions);
    let batch = self.discover(target, class, options.system)?;

    let platform = target.platform(options.system);
    let compiler = CCompiler {
      program: self.config.toolchain.cc.clone(),
      flags: target.compile_flags(options.system, options.profile),
    };
    let mapper = ArtifactPathMapper::objects(batch.root(), target.object_dir(&self.build_dir()));
    let result = self.run_step(target, &batch, &compiler, &mapper, exec, reporter).await?;

    let existed = output.exists();
    let decision = link::decide(&result, output);
    let summary = if decision.should_link() {
      let linker = CLinker {
        program: self.config.toolchain.cc.clone(),
        common: platform.common.clone(),
        link: platform.link.clone(),
      };
      let linker = RootRelative {
        root: &self.root,
        inner: &linker,
      };
      let linked = link::link(&linker, &result, output, exec).await;
      let log = match &linked {
        Ok(log) | Err(LinkError::Failed { log, .. }) => Some(log.as_str()),
        Err(_) => None,
      };
      if let Some(log) = log {
        reporter.report(BuildEvent::LinkFinished {
          target: &target.name,
          log,
        });
      }
      linked.map_err(|source| BuildError::LinkFailed {
        target: target.name.clone(),
        source,
      })?;
      if existed {
        StepSummary::Updated
      } else {
        StepSummary::Assembled
      }
    } else {
      StepSummary::NoChanges
    };

    reporter.report(BuildEvent::StepFinished {
      target: &target.name,
      summary,
    });

    Ok(TargetReport {
      name: target.name.clone(),
      kind: target.kind,
      steps: vec![StepReport {
        batch: result,
        link: Some(decision),
        summary,
      }],
    })
  }

  async fn build_shaders(
    &self,
    target: &TargetConfig,
    options: &BuildOptions,
    exec: &ExecuteConfig,
    reporter: &dyn Reporter,
  ) -> Result<TargetReport, BuildError> {
    let mut steps = Vec::with_capacity(target.stages.len());

    for stage in &target.stages {
      let batch = self.discover(target, SourceClass::new(stage), options.system)?;
      let compiler = ShaderCompiler {
        program: self.config.toolchain.shader_compiler.clone(),
        stage: stage.clone(),
      };
      let mapper = ArtifactPathMapper::shaders(batch.root());
      let result = self.run_step(target, &batch, &compiler, &mapper, exec, reporter).await?;

      let summary = if result.rebuilt_any() {
        StepSummary::Updated
      } else {
        StepSummary::NoChanges
      };
      reporter.report(BuildEvent::StepFinished {
        target: &target.name,
        summary,
      });
      steps.push(StepReport {
        batch: result,
        link: None,
        summary,
      });
    }

    Ok(TargetReport {
      name: target.name.clone(),
      kind: target.kind,
      steps,
    })
  }
}
