mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::BuilderArgs;
use crate::output::OutputFormat;

/// forge - cross-compile agents with embedded transport configuration
#[derive(Parser)]
#[command(name = "forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a payload from a JSON request
  Build {
    /// Path to the build request
    request: PathBuf,

    /// Where to write the artifact (default: its suggested filename)
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    builder: BuilderArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
  },

  /// Show the toolchain invocation for a request without running it
  Plan {
    /// Path to the build request
    request: PathBuf,

    #[command(flatten)]
    builder: BuilderArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
  },

  /// Extract an embedded value from a link flag string
  Extract {
    /// Link flag string, as passed to -ldflags
    #[arg(long, allow_hyphen_values = true)]
    flags: String,

    /// Variable name
    #[arg(long)]
    var: String,

    /// Package namespace of the variable
    #[arg(long, default_value = forge_lib::consts::MAIN_PACKAGE)]
    namespace: String,

    /// Decode the value with the key derived from this payload id
    #[arg(long, value_name = "PAYLOAD_ID")]
    key_from: Option<String>,
  },

  /// Report the machine type of a PE image
  InspectImage {
    /// Path to the image
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Build {
      request,
      out,
      builder,
      format,
    } => cmd::cmd_build(&request, out.as_deref(), builder, format),
    Commands::Plan {
      request,
      builder,
      format,
    } => cmd::cmd_plan(&request, builder, format),
    Commands::Extract {
      flags,
      var,
      namespace,
      key_from,
    } => cmd::cmd_extract(&flags, &namespace, &var, key_from.as_deref()),
    Commands::InspectImage { file, format } => cmd::cmd_inspect_image(&file, format),
  }
}
