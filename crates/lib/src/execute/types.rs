//! Types for toolchain execution.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while running the toolchain.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The toolchain process could not be started.
  #[error("failed to spawn {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The toolchain exited unsuccessfully.
  #[error("command failed with exit code {code:?}")]
  CmdFailed {
    code: Option<i32>,
    stdout: String,
    stderr: String,
  },

  /// The toolchain ran past the configured limit and was killed.
  #[error("command timed out after {timeout:?}")]
  TimedOut { timeout: Duration },

  /// I/O error while preparing or waiting on the process.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl ExecuteError {
  /// Captured standard output, when the process got far enough to produce any.
  pub fn stdout(&self) -> &str {
    match self {
      ExecuteError::CmdFailed { stdout, .. } => stdout,
      _ => "",
    }
  }

  /// Captured standard error, when the process got far enough to produce any.
  pub fn stderr(&self) -> &str {
    match self {
      ExecuteError::CmdFailed { stderr, .. } => stderr,
      _ => "",
    }
  }
}

/// Captured output of a successful toolchain run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdOutput {
  pub stdout: String,
  pub stderr: String,
}
