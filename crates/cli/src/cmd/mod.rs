mod build;
mod extract;
mod inspect;
mod plan;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use forge_lib::{BuildRequest, BuilderConfig};

pub use build::cmd_build;
pub use extract::cmd_extract;
pub use inspect::cmd_inspect_image;
pub use plan::cmd_plan;

/// Builder settings; each flag overrides the matching `FORGE_*` variable.
#[derive(Debug, Default, Args)]
pub struct BuilderArgs {
  /// Directory the toolchain writes artifacts into
  #[arg(long)]
  build_dir: Option<PathBuf>,

  /// Agent source tree to compile
  #[arg(long)]
  agent_dir: Option<PathBuf>,

  /// Go toolchain executable
  #[arg(long)]
  go: Option<String>,

  /// Obfuscating wrapper executable
  #[arg(long)]
  garble: Option<String>,

  /// Toolchain timeout (e.g. 90s, 15m)
  #[arg(long, value_parser = humantime::parse_duration)]
  timeout: Option<Duration>,
}

impl BuilderArgs {
  pub fn into_config(self) -> Result<BuilderConfig> {
    let mut config = BuilderConfig::from_env().context("Invalid builder configuration")?;
    if let Some(dir) = self.build_dir {
      config = config.with_build_dir(dir);
    }
    if let Some(dir) = self.agent_dir {
      config = config.with_agent_dir(dir);
    }
    if let Some(go) = self.go {
      config = config.with_go_program(&go);
    }
    if let Some(garble) = self.garble {
      config = config.with_garble_program(&garble);
    }
    if let Some(timeout) = self.timeout {
      config = config.with_timeout(timeout);
    }
    Ok(config)
  }
}

/// Read and parse a JSON build request.
pub fn read_request(path: &Path) -> Result<BuildRequest> {
  let text =
    std::fs::read_to_string(path).with_context(|| format!("Failed to read build request: {}", path.display()))?;
  serde_json::from_str(&text).with_context(|| format!("Failed to parse build request: {}", path.display()))
}
