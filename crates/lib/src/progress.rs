//! Step progress reporting toward the orchestrator.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

/// Named build steps, in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildStep {
  Configuring,
  Compiling,
}

impl BuildStep {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Configuring => "Configuring",
      Self::Compiling => "Compiling",
    }
  }

  pub fn description(&self) -> &'static str {
    match self {
      Self::Configuring => "Cleaning up configuration values and generating the build command",
      Self::Compiling => "Compiling the agent (maybe with obfuscation)",
    }
  }
}

impl fmt::Display for BuildStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepUpdate {
  pub step: BuildStep,
  pub success: bool,
  pub output: String,
}

/// Receives step updates as a build progresses.
pub trait ProgressReporter: Send + Sync {
  fn report(&self, update: StepUpdate);
}

/// Forwards step updates to the `tracing` log.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
  fn report(&self, update: StepUpdate) {
    if update.success {
      info!(step = %update.step, output = %update.output, "build step succeeded");
    } else {
      warn!(step = %update.step, output = %update.output, "build step failed");
    }
  }
}

/// Keeps every update in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
  updates: Mutex<Vec<StepUpdate>>,
}

impl RecordingReporter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn updates(&self) -> Vec<StepUpdate> {
    match self.updates.lock() {
      Ok(updates) => updates.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }
}

impl ProgressReporter for RecordingReporter {
  fn report(&self, update: StepUpdate) {
    match self.updates.lock() {
      Ok(mut updates) => updates.push(update),
      Err(poisoned) => poisoned.into_inner().push(update),
    }
  }
}
