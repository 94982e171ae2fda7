pub mod arch;
pub mod os;

use std::fmt;

pub use arch::{TargetArch, UnknownArch};
pub use os::TargetOs;

/// Build target combining OS and architecture (e.g., "darwin-arm64")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
  pub os: TargetOs,
  pub arch: TargetArch,
}

impl Target {
  pub fn new(os: TargetOs, arch: TargetArch) -> Self {
    Self { os, arch }
  }

  /// Returns the target string (e.g., "linux-amd64")
  pub fn triple(&self) -> String {
    format!("{}-{}", self.os, self.arch)
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.triple())
  }
}
