use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::MACOS_VERSION;

/// Target operating systems a payload can be built for.
///
/// Deserializes from the orchestrator's display names (`Linux`, `macOS`,
/// `Windows`); `as_str` yields the Go toolchain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetOs {
  #[serde(rename = "Linux")]
  Linux,
  #[serde(rename = "macOS")]
  MacOs,
  #[serde(rename = "Windows")]
  Windows,
}

impl TargetOs {
  /// Returns the `GOOS` identifier for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::MacOs => "darwin",
      Self::Windows => "windows",
    }
  }

  /// Version literal appended to artifact names, only for macOS.
  pub fn version_suffix(&self) -> Option<&'static str> {
    match self {
      Self::MacOs => Some(MACOS_VERSION),
      Self::Linux | Self::Windows => None,
    }
  }

  /// File extension of a shared library for this OS.
  pub fn shared_library_extension(&self) -> &'static str {
    match self {
      Self::Linux => "so",
      Self::MacOs => "dylib",
      Self::Windows => "dll",
    }
  }

  /// File extension of a standalone executable handed back to the orchestrator.
  pub fn executable_extension(&self) -> &'static str {
    match self {
      Self::Windows => "exe",
      Self::Linux | Self::MacOs => "bin",
    }
  }
}

impl fmt::Display for TargetOs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
