//! Binary inflation.
//!
//! The agent source tree embeds `padding.bin`. A build can ask for it to hold
//! a repeated byte pattern; otherwise, and after every build, it holds a
//! single zero byte.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::request::{BuildParameters, RequestError};

/// File in the agent source directory that carries the padding.
pub const PADDING_FILE: &str = "padding.bin";

/// Contents of the padding file when no inflation is requested.
pub const DEFAULT_PADDING: &[u8] = &[0x00];

/// Upper bound on generated padding.
pub const MAX_PADDING_LEN: usize = 512 * 1024 * 1024;

#[derive(Debug, Error)]
#[error("failed to write padding file {}: {source}", path.display())]
pub struct PaddingError {
  pub path: PathBuf,
  #[source]
  pub source: std::io::Error,
}

/// A byte pattern and how many times it is repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Padding {
  pattern: Vec<u8>,
  count: usize,
}

fn parse_byte(part: &str) -> Result<u8, RequestError> {
  let part = part.trim();
  let digits = part
    .strip_prefix("0x")
    .or_else(|| part.strip_prefix("0X"))
    .unwrap_or(part);
  u8::from_str_radix(digits, 16).map_err(|_| RequestError::InvalidInflateByte(digits.to_string()))
}

impl Padding {
  /// Read `inflate_bytes` and `inflate_count`.
  ///
  /// Returns `None` unless both are set. A count that is not a positive
  /// integer also yields `None`. Every comma-separated byte must parse as hex.
  pub fn from_parameters(params: &BuildParameters) -> Result<Option<Self>, RequestError> {
    let (Some(bytes), Some(count)) = (params.get("inflate_bytes"), params.get("inflate_count")) else {
      return Ok(None);
    };

    let count = match count.trim().parse::<usize>() {
      Ok(count) if count > 0 => count,
      _ => {
        debug!(count, "ignoring invalid inflate_count");
        return Ok(None);
      }
    };

    let pattern = bytes.split(',').map(parse_byte).collect::<Result<Vec<_>, _>>()?;
    let len = pattern
      .len()
      .checked_mul(count)
      .filter(|len| *len <= MAX_PADDING_LEN)
      .ok_or(RequestError::PaddingTooLarge(pattern.len().saturating_mul(count)))?;
    debug!(len, count, pattern_len = pattern.len(), "parsed padding");

    Ok(Some(Self { pattern, count }))
  }

  pub fn pattern(&self) -> &[u8] {
    &self.pattern
  }

  pub fn count(&self) -> usize {
    self.count
  }

  /// Total size of the generated padding.
  pub fn len(&self) -> usize {
    self.pattern.len() * self.count
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    self.pattern.repeat(self.count)
  }
}

async fn write_file(path: PathBuf, contents: &[u8]) -> Result<PathBuf, PaddingError> {
  match tokio::fs::write(&path, contents).await {
    Ok(()) => Ok(path),
    Err(source) => Err(PaddingError { path, source }),
  }
}

/// Write the padding file into `agent_dir`: the generated pattern, or the
/// default single byte when `padding` is `None`.
pub async fn write(agent_dir: &Path, padding: Option<&Padding>) -> Result<PathBuf, PaddingError> {
  let path = agent_dir.join(PADDING_FILE);
  match padding {
    Some(padding) => {
      let path = write_file(path, &padding.to_bytes()).await?;
      info!(
        path = %path.display(),
        size = padding.len(),
        count = padding.count(),
        "generated padding"
      );
      Ok(path)
    }
    None => write_file(path, DEFAULT_PADDING).await,
  }
}

/// Reset the padding file in `agent_dir` to its default contents.
pub async fn restore(agent_dir: &Path) -> Result<(), PaddingError> {
  write_file(agent_dir.join(PADDING_FILE), DEFAULT_PADDING).await.map(|_| ())
}
