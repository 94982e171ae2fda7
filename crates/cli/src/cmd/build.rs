//! Implementation of the `forge build` command.
//!
//! Runs the full pipeline for a JSON build request and writes the artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::debug;

use forge_lib::progress::{ProgressReporter, StepUpdate, TracingReporter};
use forge_lib::{BuildResult, Builder};

use super::{BuilderArgs, read_request};
use crate::output::{OutputFormat, format_bytes, print_error, print_info, print_json, print_stat, print_success};

/// Prints each step as it completes.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
  fn report(&self, update: StepUpdate) {
    if update.success {
      print_success(&format!("{}: {}", update.step, update.step.description()));
    } else {
      print_error(&format!("{} failed", update.step));
      for line in update.output.lines() {
        eprintln!("    {}", line);
      }
    }
  }
}

#[derive(Serialize)]
struct BuildOutput<'a> {
  #[serde(flatten)]
  result: &'a BuildResult,
  #[serde(skip_serializing_if = "Option::is_none")]
  artifact: Option<PathBuf>,
  #[serde(skip_serializing_if = "Option::is_none")]
  size: Option<usize>,
}

pub fn cmd_build(request_path: &Path, out: Option<&Path>, args: BuilderArgs, format: OutputFormat) -> Result<()> {
  let request = read_request(request_path)?;
  let config = args.into_config()?;

  let reporter: Arc<dyn ProgressReporter> = if format.is_json() {
    Arc::new(TracingReporter)
  } else {
    print_info(&format!("Building {} for {}", request.payload_id, request.target()));
    Arc::new(ConsoleReporter)
  };
  let builder = Builder::new(config, reporter);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let result = rt.block_on(builder.build(&request));

  let mut artifact = None;
  if let (Some(payload), Some(name)) = (&result.payload, &result.updated_filename) {
    let path = out.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(name));
    std::fs::write(&path, payload).with_context(|| format!("Failed to write artifact: {}", path.display()))?;
    debug!(path = %path.display(), size = payload.len(), "wrote artifact");
    artifact = Some(path);
  }

  if format.is_json() {
    print_json(&BuildOutput {
      result: &result,
      artifact: artifact.clone(),
      size: result.payload.as_ref().map(Vec::len),
    })?;
  } else if result.success {
    print_success(&result.message);
    if let Some(path) = &artifact {
      print_stat("Artifact", &path.display().to_string());
    }
    if let Some(payload) = &result.payload {
      print_stat("Size", &format_bytes(payload.len() as u64));
    }
  } else {
    print_error(&result.message);
    if let Some(line) = &result.command_line {
      print_stat("Command", line);
    }
    if !result.stderr.is_empty() {
      eprintln!("{}", result.stderr.trim_end());
    }
  }

  if !result.success {
    bail!("Build failed");
  }
  Ok(())
}
