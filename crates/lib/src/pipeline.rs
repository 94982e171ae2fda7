//! End-to-end build driver.
//!
//! A build runs as one linear sequence:
//! validate → assemble link flags → plan → write padding → execute →
//! restore padding → retrieve artifact.
//! Every outcome, including each failure category, is folded into a single
//! [`BuildResult`] for the orchestrator.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::artifact::{self, ArtifactError, artifact_filename};
use crate::codec::ObfuscationKey;
use crate::config::BuilderConfig;
use crate::execute::{ExecuteError, execute_plan};
use crate::ldflags::{self, AssembleError};
use crate::padding::{self, PaddingError};
use crate::plan::{BuildPlan, plan_build};
use crate::progress::ProgressReporter;
use crate::request::{BuildRequest, RequestError};

/// Terminal failure of a build. None of these are retried.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Request(#[from] RequestError),

  #[error(transparent)]
  Assemble(#[from] AssembleError),

  #[error(transparent)]
  Padding(#[from] PaddingError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error(transparent)]
  Artifact(#[from] ArtifactError),
}

impl BuildError {
  /// Short operator-facing summary of the failure category.
  pub fn summary(&self) -> &'static str {
    match self {
      BuildError::Request(_) => "Invalid build request",
      BuildError::Assemble(_) => "Failed to assemble link-time constants",
      BuildError::Padding(_) => "Failed to write padding file",
      BuildError::Execute(ExecuteError::TimedOut { .. }) => "Compilation timed out",
      BuildError::Execute(_) => "Compilation failed with errors",
      BuildError::Artifact(ArtifactError::NotImplemented(_)) => "Build mode not implemented",
      BuildError::Artifact(_) => "Failed to find final payload",
    }
  }
}

/// Final outcome of one build, consumed once by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildResult {
  pub success: bool,
  pub message: String,
  pub stdout: String,
  pub stderr: String,

  /// Command line used, when planning got that far.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub command_line: Option<String>,

  /// Suggested download name for the payload.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub updated_filename: Option<String>,

  #[serde(skip)]
  pub payload: Option<Vec<u8>>,
}

impl BuildResult {
  fn fail(mut self, err: &BuildError) -> Self {
    self.success = false;
    self.message = format!("{}: {}", err.summary(), err);
    if let BuildError::Execute(exec) = err {
      self.stdout = exec.stdout().to_string();
      self.stderr = exec.stderr().to_string();
    }
    self
  }
}

/// Drives builds with a fixed configuration and progress sink.
pub struct Builder {
  config: BuilderConfig,
  reporter: Arc<dyn ProgressReporter>,
}

impl Builder {
  pub fn new(config: BuilderConfig, reporter: Arc<dyn ProgressReporter>) -> Self {
    Self { config, reporter }
  }

  pub fn config(&self) -> &BuilderConfig {
    &self.config
  }

  /// Validate `request`, assemble its link flags and plan the toolchain
  /// invocation without running anything.
  pub fn plan(&self, request: &BuildRequest) -> Result<BuildPlan, BuildError> {
    let profile = request.validate()?;
    let key = request
      .obfuscate
      .then(|| ObfuscationKey::derive(&request.payload_id));
    let flags = ldflags::assemble(profile, &request.parameters, &request.payload_id, key.as_ref())?;
    Ok(plan_build(request, &flags.render(), &self.config)?)
  }

  /// Run a build to completion.
  pub async fn build(&self, request: &BuildRequest) -> BuildResult {
    let mut result = BuildResult::default();
    match self.run(request, &mut result).await {
      Ok(()) => result,
      Err(err) => {
        warn!(payload_id = %request.payload_id, error = %err, "build failed");
        result.fail(&err)
      }
    }
  }

  async fn run(&self, request: &BuildRequest, result: &mut BuildResult) -> Result<(), BuildError> {
    let plan = self.plan(request)?;
    result.command_line = Some(plan.command_line());

    padding::write(&plan.working_dir, plan.padding.as_ref()).await?;
    let executed = execute_plan(&plan, self.config.timeout, self.reporter.as_ref()).await;
    if let Err(err) = padding::restore(&plan.working_dir).await {
      warn!(error = %err, "failed to restore default padding file");
    }
    let output = executed?;
    result.stdout = output.stdout;
    result.stderr = output.stderr;

    let payload = artifact::retrieve(&plan).await?;
    info!(
      payload_id = %request.payload_id,
      output = %plan.output_name,
      size = payload.len(),
      "build succeeded"
    );

    result.success = true;
    result.message = format!("Successfully built {}", plan.output_name);
    result.updated_filename = Some(artifact_filename(plan.mode, plan.target.os));
    result.payload = Some(payload);
    Ok(())
  }
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use crate::codec;
  use crate::ldflags::extract;
  use crate::platform::TargetOs;
  use crate::profile::ProfileValue;
  use crate::progress::{BuildStep, RecordingReporter};
  use crate::request::BuildMode;
  use crate::testutil::{FakeToolchain, http_profile, linux_request};

  fn builder(toolchain: &FakeToolchain) -> (Builder, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::new());
    (Builder::new(toolchain.config(), reporter.clone()), reporter)
  }

  fn ldflags_arg(args: &[String]) -> String {
    let pos = args.iter().position(|a| a == "-ldflags").unwrap();
    args[pos + 1].clone()
  }

  #[tokio::test]
  async fn plaintext_build_embeds_literal_values() {
    let toolchain = FakeToolchain::new();
    let (builder, reporter) = builder(&toolchain);
    let request = linux_request();

    let result = builder.build(&request).await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.payload.as_deref(), Some(&b"MZfake"[..]));
    assert_eq!(result.updated_filename.as_deref(), Some("agent.bin"));
    assert!(result.stderr.contains("toolchain note"));

    let flags = ldflags_arg(&toolchain.recorded_args());
    assert!(flags.contains("-X 'main.callbackHost=https://c2.example.com'"));
    assert!(flags.contains("-X 'main.callbackPort=443'"));
    assert_eq!(extract(&flags, "main", "payloadUUID"), request.payload_id);

    let steps: Vec<_> = reporter.updates().iter().map(|u| (u.step, u.success)).collect();
    assert_eq!(steps, vec![(BuildStep::Configuring, true), (BuildStep::Compiling, true)]);
  }

  #[tokio::test]
  async fn obfuscated_build_hides_sensitive_values() {
    let toolchain = FakeToolchain::new();
    let (builder, _) = builder(&toolchain);
    let mut request = linux_request();
    request.obfuscate = true;

    let result = builder.build(&request).await;
    assert!(result.success, "{}", result.message);

    let args = toolchain.recorded_args();
    assert_eq!(&args[..6], &["-tiny", "-literals", "-debug", "-seed", "random", "build"]);

    let flags = ldflags_arg(&args);
    assert!(!flags.contains("c2.example.com"));
    assert_eq!(extract(&flags, "main", "callbackPort"), "443");

    let key = ObfuscationKey::derive(&request.payload_id);
    assert_eq!(extract(&flags, "main", "obfuscationKey"), key.to_base64());
    let host = codec::decode(&extract(&flags, "main", "callbackHost"), key.as_bytes()).unwrap();
    assert_eq!(host, "https://c2.example.com");
  }

  #[tokio::test]
  async fn profile_count_is_checked_before_any_step() {
    for profiles in [vec![], vec![http_profile(), http_profile()]] {
      let toolchain = FakeToolchain::new();
      let (builder, reporter) = builder(&toolchain);
      let mut request = linux_request();
      request.profiles = profiles;

      let result = builder.build(&request).await;

      assert!(!result.success);
      assert!(result.message.starts_with("Invalid build request"));
      assert!(result.command_line.is_none());
      assert!(reporter.updates().is_empty());
      assert!(toolchain.recorded_args().is_empty());
    }
  }

  #[tokio::test]
  async fn mistyped_profile_fails_before_spawn() {
    let toolchain = FakeToolchain::new();
    let (builder, reporter) = builder(&toolchain);
    let mut request = linux_request();
    request.profiles = vec![http_profile().with("callback_host", ProfileValue::Number(1.0))];

    let result = builder.build(&request).await;

    assert!(!result.success);
    assert!(result.message.contains("callback_host"));
    assert!(reporter.updates().is_empty());
    assert!(toolchain.recorded_args().is_empty());
  }

  #[tokio::test]
  async fn compiler_failure_carries_diagnostics() {
    let toolchain = FakeToolchain::failing();
    let (builder, reporter) = builder(&toolchain);

    let result = builder.build(&linux_request()).await;

    assert!(!result.success);
    assert!(result.message.starts_with("Compilation failed with errors"));
    assert!(result.stderr.contains("undefined: callbackHost"));
    assert!(result.stdout.contains("building linux/amd64"));
    assert!(result.command_line.unwrap().contains("-buildmode default"));
    assert!(result.payload.is_none());
    assert!(!reporter.updates()[1].success);
  }

  #[tokio::test]
  async fn missing_artifact_after_clean_exit() {
    let toolchain = FakeToolchain::silent();
    let (builder, reporter) = builder(&toolchain);

    let result = builder.build(&linux_request()).await;

    assert!(!result.success);
    assert!(result.message.starts_with("Failed to find final payload"));
    assert!(result.message.contains("final payload not found"));
    assert!(reporter.updates()[1].success);
  }

  #[tokio::test]
  async fn shellcode_fails_after_compiling() {
    let toolchain = FakeToolchain::new();
    let (builder, _) = builder(&toolchain);
    let mut request = linux_request();
    request.selected_os = TargetOs::Windows;
    request.mode = BuildMode::Shellcode;

    let result = builder.build(&request).await;

    assert!(!result.success);
    assert!(result.message.contains("not implemented"));
    let dll = format!("{}-windows-amd64.dll", request.payload_id);
    assert!(toolchain.temp.path().join("build").join(dll).exists());
  }

  #[tokio::test]
  async fn shared_windows_build_is_named_dll() {
    let toolchain = FakeToolchain::new();
    let (builder, _) = builder(&toolchain);
    let mut request = linux_request();
    request.selected_os = TargetOs::Windows;
    request.mode = BuildMode::SharedLibrary;

    let result = builder.build(&request).await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.updated_filename.as_deref(), Some("agent.dll"));
    assert!(toolchain.recorded_args().contains(&"http,shared".to_string()));
  }

  #[tokio::test]
  async fn build_parameters_are_embedded() {
    let toolchain = FakeToolchain::new();
    let (builder, _) = builder(&toolchain);
    let mut request = linux_request();
    request.parameters.proxy_url = Some("http://proxy:8080".to_string());
    request.parameters.working_hours_start = Some("09:00".to_string());

    let result = builder.build(&request).await;
    assert!(result.success, "{}", result.message);

    let flags = ldflags_arg(&toolchain.recorded_args());
    assert_eq!(extract(&flags, "main", "proxyURL"), "http://proxy:8080");
    assert_eq!(extract(&flags, "main", "workingHoursStart"), "09:00");
    assert_eq!(extract(&flags, "main", "hostHeader"), "");
  }

  #[tokio::test]
  async fn inflation_is_compiled_in_then_reset() {
    let toolchain = FakeToolchain::new();
    let (builder, reporter) = builder(&toolchain);
    let mut request = linux_request();
    request.parameters.inflate_bytes = Some("0x41,0x42".to_string());
    request.parameters.inflate_count = Some("3".to_string());

    let result = builder.build(&request).await;
    assert!(result.success, "{}", result.message);

    let agent = toolchain.agent_dir();
    assert_eq!(std::fs::read(agent.join("padding.seen")).unwrap(), b"ABABAB");
    assert_eq!(std::fs::read(agent.join(padding::PADDING_FILE)).unwrap(), padding::DEFAULT_PADDING);
    assert!(reporter.updates()[0].output.contains("Binary inflation: 6 bytes"));
  }

  #[tokio::test]
  async fn padding_is_reset_after_failed_compile() {
    let toolchain = FakeToolchain::failing();
    let (builder, _) = builder(&toolchain);
    let mut request = linux_request();
    request.parameters.inflate_bytes = Some("0x90".to_string());
    request.parameters.inflate_count = Some("32".to_string());

    let result = builder.build(&request).await;
    assert!(!result.success);

    let agent = toolchain.agent_dir();
    assert_eq!(std::fs::read(agent.join("padding.seen")).unwrap(), vec![0x90; 32]);
    assert_eq!(std::fs::read(agent.join(padding::PADDING_FILE)).unwrap(), padding::DEFAULT_PADDING);
  }

  #[tokio::test]
  async fn bad_inflate_byte_fails_before_any_step() {
    let toolchain = FakeToolchain::new();
    let (builder, reporter) = builder(&toolchain);
    let mut request = linux_request();
    request.parameters.inflate_bytes = Some("0x4G".to_string());
    request.parameters.inflate_count = Some("3".to_string());

    let result = builder.build(&request).await;

    assert!(!result.success);
    assert_eq!(result.message, "Invalid build request: failed to parse inflate byte '4G'");
    assert!(reporter.updates().is_empty());
    assert!(toolchain.recorded_args().is_empty());
    assert!(!toolchain.agent_dir().join(padding::PADDING_FILE).exists());
  }

  #[tokio::test]
  async fn comma_in_profile_name_never_reaches_tags() {
    let toolchain = FakeToolchain::new();
    let (builder, reporter) = builder(&toolchain);
    let mut request = linux_request();
    request.profiles = vec![crate::profile::TransportProfile::new("http,shared")];

    let result = builder.build(&request).await;

    assert!(!result.success);
    assert!(result.message.starts_with("Invalid build request"));
    assert!(reporter.updates().is_empty());
    assert!(toolchain.recorded_args().is_empty());
  }

  #[tokio::test]
  async fn unwritable_agent_dir_fails_before_spawn() {
    let toolchain = FakeToolchain::new();
    let config = toolchain.config().with_agent_dir(toolchain.temp.path().join("missing"));
    let reporter = Arc::new(RecordingReporter::new());
    let builder = Builder::new(config, reporter.clone());

    let result = builder.build(&linux_request()).await;

    assert!(!result.success);
    assert!(result.message.starts_with("Failed to write padding file"));
    assert!(reporter.updates().is_empty());
  }

  #[test]
  fn json_result_skips_payload_bytes() {
    let result = BuildResult {
      success: true,
      message: "ok".to_string(),
      payload: Some(vec![1, 2, 3]),
      ..Default::default()
    };
    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("payload").is_none());
    assert!(json.get("command_line").is_none());
    assert_eq!(json["success"], true);
  }
}
