//! Shared fixtures for unit tests.

#[cfg(unix)]
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::sync::OnceLock;

#[cfg(unix)]
use tempfile::TempDir;

#[cfg(unix)]
use crate::config::BuilderConfig;
use crate::platform::{TargetArch, TargetOs};
use crate::profile::{ProfileValue, TransportProfile};
use crate::request::{BuildMode, BuildParameters, BuildRequest};

pub const PAYLOAD_ID: &str = "4b1e07c2-9d3a-4f55-8c61-2a7e5d0b93f1";
pub const AES_KEY: &str = "hfN9Vx7qzKcL3mDR0PZ8r+Jb/1yW4sAe6XtQuO2kIgE=";

/// A fully populated http profile.
pub fn http_profile() -> TransportProfile {
  TransportProfile::new("http")
    .with("callback_host", ProfileValue::String("https://c2.example.com".to_string()))
    .with("callback_port", ProfileValue::Number(443.0))
    .with("callback_interval", ProfileValue::Number(10.0))
    .with("callback_jitter", ProfileValue::Number(23.0))
    .with(
      "headers",
      ProfileValue::Map(
        [(
          "User-Agent".to_string(),
          ProfileValue::String("Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()),
        )]
        .into_iter()
        .collect(),
      ),
    )
    .with("get_uri", ProfileValue::String("/index".to_string()))
    .with("post_uri", ProfileValue::String("/data".to_string()))
    .with(
      "AESPSK",
      ProfileValue::Map(
        [
          ("value".to_string(), ProfileValue::String("aes256_hmac".to_string())),
          ("enc_key".to_string(), ProfileValue::String(AES_KEY.to_string())),
        ]
        .into_iter()
        .collect(),
      ),
    )
    .with("encrypted_exchange_check", ProfileValue::Boolean(true))
}

/// Linux/amd64 executable with the http profile and obfuscation off.
pub fn linux_request() -> BuildRequest {
  BuildRequest {
    payload_id: PAYLOAD_ID.to_string(),
    selected_os: TargetOs::Linux,
    architecture: TargetArch::Amd64,
    mode: BuildMode::Executable,
    profiles: vec![http_profile()],
    obfuscate: false,
    parameters: BuildParameters::default(),
  }
}

/// Arguments that make `/bin/sh` run `script`.
pub fn sh_args(script: &str) -> Vec<String> {
  vec!["-c".to_string(), script.to_string()]
}

#[cfg(unix)]
/// Stand-in for the Go toolchain. Records its arguments to `args.txt` in the
/// working directory and behaves according to the `mode` file next to it.
const FAKE_GO: &str = r#"#!/bin/sh
printf '%s\n' "$@" > args.txt
cp padding.bin padding.seen 2>/dev/null
mode=$(cat mode 2>/dev/null)
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
case "$mode" in
  fail)
    echo "building $GOOS/$GOARCH"
    echo "./main.go:12:2: undefined: callbackHost" >&2
    exit 2
    ;;
  silent)
    exit 0
    ;;
esac
echo "building $GOOS/$GOARCH"
echo "toolchain note" >&2
printf 'MZfake' > "$out"
"#;

#[cfg(unix)]
/// The fake toolchain script is written once per test binary so that no
/// test executes a file another thread may still hold open for writing.
fn fake_go() -> &'static Path {
  static SCRIPT: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
  let (_, path) = SCRIPT.get_or_init(|| {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("go");
    std::fs::write(&path, FAKE_GO).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    (dir, path)
  });
  path
}

#[cfg(unix)]
/// Isolated build and agent directories wired to the fake toolchain.
pub struct FakeToolchain {
  pub temp: TempDir,
}

#[cfg(unix)]
impl FakeToolchain {
  fn with_mode(mode: &str) -> Self {
    let temp = TempDir::new().unwrap();
    let agent = temp.path().join("agent");
    std::fs::create_dir_all(&agent).unwrap();
    std::fs::write(agent.join("mode"), mode).unwrap();
    Self { temp }
  }

  pub fn new() -> Self {
    Self::with_mode("ok")
  }

  /// Exits 2 with a compiler error on stderr.
  pub fn failing() -> Self {
    Self::with_mode("fail")
  }

  /// Exits 0 without writing an artifact.
  pub fn silent() -> Self {
    Self::with_mode("silent")
  }

  pub fn config(&self) -> BuilderConfig {
    let program = fake_go().to_string_lossy();
    BuilderConfig::default()
      .with_build_dir(self.temp.path().join("build"))
      .with_agent_dir(self.temp.path().join("agent"))
      .with_go_program(&program)
      .with_garble_program(&program)
  }

  pub fn agent_dir(&self) -> PathBuf {
    self.temp.path().join("agent")
  }

  /// Arguments of the last invocation, one per element.
  pub fn recorded_args(&self) -> Vec<String> {
    std::fs::read_to_string(self.temp.path().join("agent").join("args.txt"))
      .map(|text| text.lines().map(str::to_string).collect())
      .unwrap_or_default()
  }
}
