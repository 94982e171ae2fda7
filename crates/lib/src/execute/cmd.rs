//! Child process execution.
//!
//! The toolchain is started directly from a program and argument vector, so
//! link flags keep their quoting without a shell in between.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use super::types::{CmdOutput, ExecuteError};

/// Run `program` with `args` inside `cwd` and capture its output.
///
/// Stdin is closed. `env` is merged over the inherited environment. The
/// process is killed if it outlives `timeout` or if the returned future is
/// dropped.
pub async fn run_command(
  program: &str,
  args: &[String],
  env: &BTreeMap<String, String>,
  cwd: &Path,
  timeout: Duration,
) -> Result<CmdOutput, ExecuteError> {
  info!(program = %program, cwd = ?cwd, "executing command");

  let child = Command::new(program)
    .args(args)
    .envs(env)
    .current_dir(cwd)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true)
    .spawn()
    .map_err(|source| ExecuteError::Spawn {
      program: program.to_string(),
      source,
    })?;

  let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
    Ok(output) => output?,
    Err(_) => return Err(ExecuteError::TimedOut { timeout }),
  };

  let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
  let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

  if !output.status.success() {
    if !stderr.is_empty() {
      debug!(stderr = %stderr, "command stderr");
    }
    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command stdout");
    }
    return Err(ExecuteError::CmdFailed {
      code: output.status.code(),
      stdout,
      stderr,
    });
  }

  debug!(stdout_len = stdout.len(), stderr_len = stderr.len(), "command finished");
  Ok(CmdOutput { stdout, stderr })
}
