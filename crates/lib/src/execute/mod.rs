//! Toolchain execution with step progress reporting.
//!
//! Runs a [`BuildPlan`] to completion and reports two steps to the
//! orchestrator:
//! - `Configuring`, before the process starts, carrying the command line
//! - `Compiling`, after it exits, carrying the captured output
//!
//! Failures are terminal and never retried.

pub mod cmd;
pub mod types;

use std::time::Duration;

use tracing::{info, warn};

use crate::plan::BuildPlan;
use crate::progress::{BuildStep, ProgressReporter, StepUpdate};

pub use cmd::run_command;
pub use types::{CmdOutput, ExecuteError};

/// Output text of a successful `Compiling` step.
///
/// Stderr is always included; stdout is left out for obfuscated builds,
/// where the wrapper's output is large and of little use.
fn compiled_output(output: &CmdOutput, obfuscated: bool) -> String {
  let mut text = String::from("Successfully executed\n");
  if !obfuscated {
    text.push_str(&output.stdout);
    text.push('\n');
  }
  text.push_str(&output.stderr);
  text
}

fn failed_output(err: &ExecuteError) -> String {
  format!("failed to compile\n{}\n{}\n{}", err.stderr(), err.stdout(), err)
}

/// Run `plan` and report its progress.
pub async fn execute_plan(
  plan: &BuildPlan,
  timeout: Duration,
  reporter: &dyn ProgressReporter,
) -> Result<CmdOutput, ExecuteError> {
  let command_line = plan.command_line();
  let mut configured = format!("Successfully configured\n{}", command_line);
  if let Some(padding) = &plan.padding {
    configured.push_str(&format!(
      "\nBinary inflation: {} bytes ({} x {}-byte pattern)",
      padding.len(),
      padding.count(),
      padding.pattern().len()
    ));
  }
  reporter.report(StepUpdate {
    step: BuildStep::Configuring,
    success: true,
    output: configured,
  });

  let result = async {
    if let Some(parent) = plan.output_path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    run_command(&plan.program, &plan.args, &plan.env, &plan.working_dir, timeout).await
  }
  .await;

  match result {
    Ok(output) => {
      info!(output = %plan.output_name, "toolchain finished");
      reporter.report(StepUpdate {
        step: BuildStep::Compiling,
        success: true,
        output: compiled_output(&output, plan.obfuscated),
      });
      Ok(output)
    }
    Err(err) => {
      warn!(error = %err, command = %command_line, "toolchain failed");
      reporter.report(StepUpdate {
        step: BuildStep::Compiling,
        success: false,
        output: failed_output(&err),
      });
      Err(err)
    }
  }
}
