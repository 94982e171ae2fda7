//! Implementation of the `forge plan` command.
//!
//! Validates a request, assembles its link flags and prints the toolchain
//! invocation without running it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use forge_lib::Builder;
use forge_lib::progress::TracingReporter;

use super::{BuilderArgs, read_request};
use crate::output::{OutputFormat, print_json, print_stat, print_success};

#[derive(Serialize)]
struct PlanOutput<'a> {
  program: &'a str,
  args: &'a [String],
  env: &'a BTreeMap<String, String>,
  working_dir: &'a Path,
  output_path: &'a PathBuf,
  obfuscated: bool,
  command_line: String,
}

pub fn cmd_plan(request_path: &Path, args: BuilderArgs, format: OutputFormat) -> Result<()> {
  let request = read_request(request_path)?;
  let builder = Builder::new(args.into_config()?, Arc::new(TracingReporter));
  let plan = builder.plan(&request)?;

  if format.is_json() {
    print_json(&PlanOutput {
      program: &plan.program,
      args: &plan.args,
      env: &plan.env,
      working_dir: &plan.working_dir,
      output_path: &plan.output_path,
      obfuscated: plan.obfuscated,
      command_line: plan.command_line(),
    })?;
  } else {
    print_success(&format!("Plan for {} ({}, {})", request.payload_id, plan.target, plan.mode));
    print_stat("Output", &plan.output_path.display().to_string());
    print_stat("Working dir", &plan.working_dir.display().to_string());
    print_stat("Obfuscated", if plan.obfuscated { "yes" } else { "no" });
    println!();
    println!("{}", plan.command_line());
  }

  Ok(())
}
