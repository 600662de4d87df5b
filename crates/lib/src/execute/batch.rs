//! Compile batch runner.
//!
//! Runs one [`BuildBatch`] to completion:
//! 1. Maps every source to its artifact, rejecting collisions up front
//! 2. Asks the staleness oracle about each pair
//! 3. Compiles stale sources on a bounded pool of tasks
//! 4. Waits for every task before returning
//!
//! A failing compile never cancels its siblings; the batch result carries
//! every failure so a single run reports all of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::artifact::ArtifactPathMapper;
use crate::execute::cmd::{ToolCommand, run_tool};
use crate::execute::types::{BatchResult, CompileOutcome, ExecuteConfig, ExecuteError, FileResult};
use crate::source::BuildBatch;
use crate::staleness::StalenessOracle;
use crate::toolchain::CompileCommandBuilder;
use crate::util::error_chain;

/// Compile every stale source of `batch`.
///
/// # Errors
///
/// Returns an error only for conditions that make the batch meaningless:
/// colliding artifact paths, unreadable timestamps, or an artifact directory
/// that cannot be created. Compiler failures are reported in the result.
pub async fn run_batch(
  batch: &BuildBatch,
  builder: &dyn CompileCommandBuilder,
  oracle: &dyn StalenessOracle,
  mapper: &ArtifactPathMapper,
  config: &ExecuteConfig,
) -> Result<BatchResult, ExecuteError> {
  info!(class = %batch.class(), files = batch.len(), "starting batch");

  let artifacts = mapper.map_all(batch.files())?;

  let mut outcomes: Vec<Option<CompileOutcome>> = vec![None; batch.len()];
  let mut pending: Vec<(usize, ToolCommand)> = Vec::new();

  for (index, (source, artifact)) in batch.files().iter().zip(&artifacts).enumerate() {
    if !oracle.is_stale(source.path(), artifact)? {
      debug!(source = %source, "artifact is fresh");
      outcomes[index] = Some(CompileOutcome::Skipped);
      continue;
    }

    ensure_parent_dir(artifact)?;
    pending.push((index, builder.compile_command(source.path(), artifact)));
  }

  for (index, outcome) in compile_all(pending, config).await {
    outcomes[index] = Some(outcome);
  }

  let files: Vec<FileResult> = batch
    .files()
    .iter()
    .cloned()
    .zip(artifacts)
    .zip(outcomes)
    .map(|((source, artifact), outcome)| FileResult {
      source,
      artifact,
      outcome: outcome.unwrap_or_else(|| CompileOutcome::Failed {
        code: None,
        output: "compile task did not complete".to_string(),
      }),
    })
    .collect();

  for failure in files.iter().filter(|f| f.outcome.is_failed()) {
    debug!(source = %failure.source, "compile failed");
  }

  let result = BatchResult {
    class: batch.class().name().to_string(),
    files,
  };

  info!(
    class = %batch.class(),
    compiled = result.compiled_count(),
    skipped = result.skipped_count(),
    failed = result.failures().count(),
    "batch complete"
  );

  Ok(result)
}

fn ensure_parent_dir(artifact: &Path) -> Result<(), ExecuteError> {
  match artifact.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => {
      std::fs::create_dir_all(parent).map_err(|source| ExecuteError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })
    }
    _ => Ok(()),
  }
}

/// Run `commands` with at most `config.jobs` in flight and collect every
/// outcome. Returns only after all tasks have finished.
async fn compile_all(commands: Vec<(usize, ToolCommand)>, config: &ExecuteConfig) -> Vec<(usize, CompileOutcome)> {
  let semaphore = Arc::new(Semaphore::new(config.jobs.max(1)));
  let mut join_set = JoinSet::new();

  for (index, command) in commands {
    let semaphore = semaphore.clone();
    let cwd: Option<PathBuf> = config.working_dir.clone();

    join_set.spawn(async move {
      let Ok(_permit) = semaphore.acquire().await else {
        return (
          index,
          CompileOutcome::Failed {
            code: None,
            output: "worker pool closed".to_string(),
          },
        );
      };

      let outcome = match run_tool(&command, cwd.as_deref()).await {
        Ok(out) if out.success => CompileOutcome::Compiled { output: out.output },
        Ok(out) => CompileOutcome::Failed {
          code: out.code,
          output: out.output,
        },
        Err(e) => CompileOutcome::Failed {
          code: None,
          output: error_chain(&e),
        },
      };

      (index, outcome)
    });
  }

  let mut results = Vec::new();

  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok(result) => results.push(result),
      Err(e) => {
        // The missing slot is reported as a failure by the caller.
        error!(error = %e, "compile task panicked");
      }
    }
  }

  results
}
