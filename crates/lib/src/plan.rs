//! Toolchain command planning.
//!
//! Turns a validated request and its rendered link flags into the exact
//! program, arguments and environment of one cross-compilation, plus the
//! deterministic name of the artifact it will produce.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use crate::config::BuilderConfig;
use crate::padding::Padding;
use crate::platform::{Target, TargetArch, TargetOs};
use crate::request::{BuildMode, BuildRequest, RequestError};

/// Arguments placed before `build` when the obfuscating wrapper is used.
pub const GARBLE_ARGS: &[&str] = &["-tiny", "-literals", "-debug", "-seed", "random"];

/// Build tag that pulls in the exported entry points for shared objects.
pub const SHARED_TAG: &str = "shared";

/// A fully resolved toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
  pub program: String,
  pub args: Vec<String>,
  pub env: BTreeMap<String, String>,
  pub working_dir: PathBuf,
  pub output_name: String,
  pub output_path: PathBuf,
  pub target: Target,
  pub mode: BuildMode,
  pub obfuscated: bool,
  /// Inflation written to the agent source tree before compiling.
  pub padding: Option<Padding>,
}

impl BuildPlan {
  /// Render the invocation as a single shell-style line for progress
  /// reporting and diagnostics. The plan itself is never run through a shell.
  pub fn command_line(&self) -> String {
    let mut words: Vec<Cow<'_, str>> = self
      .env
      .iter()
      .map(|(key, value)| Cow::Owned(format!("{}={}", key, escape(value))))
      .collect();
    words.push(escape(&self.program));
    words.extend(self.args.iter().map(|arg| escape(arg)));
    words.join(" ")
  }
}

fn escape(word: &str) -> Cow<'_, str> {
  shell_escape::unix::escape(Cow::Borrowed(word))
}

/// C and C++ cross compilers for building a shared object on a non-native target.
pub fn cross_compilers(target: Target, mode: BuildMode) -> Option<(&'static str, Option<&'static str>)> {
  if !mode.is_shared_object() {
    return None;
  }

  match (target.os, target.arch) {
    (TargetOs::MacOs, _) => Some(("o64-clang", Some("o64-clang++"))),
    (TargetOs::Windows, TargetArch::I386) => Some(("i686-w64-mingw32-gcc", None)),
    (TargetOs::Windows, _) => Some(("x86_64-w64-mingw32-gcc", None)),
    (TargetOs::Linux, TargetArch::Arm64) => Some(("aarch64-linux-gnu-gcc", None)),
    (TargetOs::Linux, _) => None,
  }
}

/// Deterministic artifact name: `{id}-{os}[-{version}]-{arch}[.{ext}]`.
pub fn output_name(payload_id: &str, target: Target, mode: BuildMode) -> String {
  let mut name = format!("{}-{}", payload_id, target.os);
  if let Some(version) = target.os.version_suffix() {
    name.push('-');
    name.push_str(version);
  }
  name.push('-');
  name.push_str(target.arch.as_str());

  match mode {
    BuildMode::Executable => {}
    BuildMode::SharedLibrary => {
      name.push('.');
      name.push_str(target.os.shared_library_extension());
    }
    // The DLL is the input of the shellcode conversion.
    BuildMode::Shellcode => name.push_str(".dll"),
  }
  name
}

/// Plan the toolchain invocation for `request`.
pub fn plan_build(request: &BuildRequest, ldflags: &str, config: &BuilderConfig) -> Result<BuildPlan, RequestError> {
  let profile = request.validate()?;
  let padding = Padding::from_parameters(&request.parameters)?;
  let target = request.target();
  let mode = request.mode;

  let mut env = BTreeMap::new();
  env.insert("GOOS".to_string(), target.os.as_str().to_string());
  env.insert("GOARCH".to_string(), target.arch.as_str().to_string());
  env.insert(
    "CGO_ENABLED".to_string(),
    if mode.is_shared_object() { "1" } else { "0" }.to_string(),
  );
  env.insert("GOGARBLE".to_string(), "*".to_string());

  if let Some((cc, cxx)) = cross_compilers(target, mode) {
    env.insert("CC".to_string(), cc.to_string());
    if let Some(cxx) = cxx {
      env.insert("CXX".to_string(), cxx.to_string());
    }
  }

  let mut tags = profile.name.clone();
  if mode.is_shared_object() {
    tags.push(',');
    tags.push_str(SHARED_TAG);
  }

  let output_name = output_name(&request.payload_id, target, mode);
  let output_path = config.build_dir.join(&output_name);

  let (program, mut args) = if request.obfuscate {
    (
      config.garble_program.clone(),
      GARBLE_ARGS.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
    )
  } else {
    (config.go_program.clone(), Vec::new())
  };
  args.extend([
    "build".to_string(),
    "-tags".to_string(),
    tags,
    "-buildmode".to_string(),
    mode.go_buildmode().to_string(),
    "-ldflags".to_string(),
    ldflags.to_string(),
    "-o".to_string(),
    output_path.to_string_lossy().into_owned(),
    ".".to_string(),
  ]);

  info!(
    target = %target,
    mode = %mode,
    obfuscated = request.obfuscate,
    output = %output_name,
    "planned build"
  );

  Ok(BuildPlan {
    program,
    args,
    env,
    working_dir: config.agent_dir.clone(),
    output_name,
    output_path,
    target,
    mode,
    obfuscated: request.obfuscate,
    padding,
  })
}
