use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CPU architectures the toolchain can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetArch {
  Amd64,
  I386,
  Arm,
  Arm64,
  Mips,
  Mips64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported architecture: {0}")]
pub struct UnknownArch(pub String);

impl TargetArch {
  pub const ALL: [TargetArch; 6] = [
    Self::Amd64,
    Self::I386,
    Self::Arm,
    Self::Arm64,
    Self::Mips,
    Self::Mips64,
  ];

  /// Returns the `GOARCH` identifier for this architecture
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Amd64 => "amd64",
      Self::I386 => "386",
      Self::Arm => "arm",
      Self::Arm64 => "arm64",
      Self::Mips => "mips",
      Self::Mips64 => "mips64",
    }
  }
}

impl FromStr for TargetArch {
  type Err = UnknownArch;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|arch| arch.as_str() == s)
      .ok_or_else(|| UnknownArch(s.to_string()))
  }
}

impl TryFrom<String> for TargetArch {
  type Error = UnknownArch;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<TargetArch> for String {
  fn from(arch: TargetArch) -> Self {
    arch.as_str().to_string()
  }
}

impl fmt::Display for TargetArch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
