//! Builder configuration.
//!
//! Defaults match the build container layout; each value can be overridden
//! through a `FORGE_*` environment variable.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::consts::{
  DEFAULT_AGENT_DIR, DEFAULT_BUILD_DIR, DEFAULT_BUILD_TIMEOUT_SECS, DEFAULT_GARBLE, DEFAULT_GO,
};

pub const ENV_BUILD_DIR: &str = "FORGE_BUILD_DIR";
pub const ENV_AGENT_DIR: &str = "FORGE_AGENT_DIR";
pub const ENV_GO: &str = "FORGE_GO";
pub const ENV_GARBLE: &str = "FORGE_GARBLE";
pub const ENV_BUILD_TIMEOUT: &str = "FORGE_BUILD_TIMEOUT";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid {var} value '{value}': {source}")]
  InvalidDuration {
    var: &'static str,
    value: String,
    source: humantime::DurationError,
  },

  #[error("{0} must be greater than zero")]
  ZeroTimeout(&'static str),
}

/// Where and how the toolchain runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
  /// Directory the toolchain writes artifacts into.
  pub build_dir: PathBuf,

  /// Agent source tree; the toolchain's working directory.
  pub agent_dir: PathBuf,

  /// Go toolchain executable.
  pub go_program: String,

  /// Obfuscating compiler wrapper executable.
  pub garble_program: String,

  /// Upper bound on a single toolchain invocation.
  pub timeout: Duration,
}

impl Default for BuilderConfig {
  fn default() -> Self {
    Self {
      build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
      agent_dir: PathBuf::from(DEFAULT_AGENT_DIR),
      go_program: DEFAULT_GO.to_string(),
      garble_program: DEFAULT_GARBLE.to_string(),
      timeout: Duration::from_secs(DEFAULT_BUILD_TIMEOUT_SECS),
    }
  }
}

impl BuilderConfig {
  /// Defaults overlaid with any `FORGE_*` environment variables.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();

    if let Ok(path) = std::env::var(ENV_BUILD_DIR) {
      config.build_dir = PathBuf::from(path);
    }
    if let Ok(path) = std::env::var(ENV_AGENT_DIR) {
      config.agent_dir = PathBuf::from(path);
    }
    if let Ok(program) = std::env::var(ENV_GO) {
      config.go_program = program;
    }
    if let Ok(program) = std::env::var(ENV_GARBLE) {
      config.garble_program = program;
    }
    if let Ok(value) = std::env::var(ENV_BUILD_TIMEOUT) {
      config.timeout = parse_timeout(ENV_BUILD_TIMEOUT, &value)?;
    }

    Ok(config)
  }

  pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.build_dir = dir.into();
    self
  }

  pub fn with_agent_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.agent_dir = dir.into();
    self
  }

  pub fn with_go_program(mut self, program: &str) -> Self {
    self.go_program = program.to_string();
    self
  }

  pub fn with_garble_program(mut self, program: &str) -> Self {
    self.garble_program = program.to_string();
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }
}

/// Parse a humantime duration such as `90s` or `15m`.
pub fn parse_timeout(var: &'static str, value: &str) -> Result<Duration, ConfigError> {
  let timeout = humantime::parse_duration(value.trim()).map_err(|source| ConfigError::InvalidDuration {
    var,
    value: value.to_string(),
    source,
  })?;
  if timeout.is_zero() {
    return Err(ConfigError::ZeroTimeout(var));
  }
  Ok(timeout)
}
