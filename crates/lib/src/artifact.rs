//! Retrieval of the produced binary.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::ARTIFACT_BASENAME;
use crate::plan::BuildPlan;
use crate::platform::TargetOs;
use crate::request::BuildMode;

#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("final payload not found at {}", path.display())]
  NotFound { path: PathBuf },

  #[error("{0} conversion is not implemented")]
  NotImplemented(BuildMode),

  #[error("failed to read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Suggested download name for the artifact of `mode` on `os`.
pub fn artifact_filename(mode: BuildMode, os: TargetOs) -> String {
  let ext = match mode {
    BuildMode::Executable => os.executable_extension(),
    BuildMode::SharedLibrary => os.shared_library_extension(),
    BuildMode::Shellcode => "bin",
  };
  format!("{}.{}", ARTIFACT_BASENAME, ext)
}

/// Read the artifact `plan` produced.
///
/// A missing file is reported before the build mode is considered, so a
/// shellcode build whose compile step left nothing behind still fails as
/// not found. Errors other than absence while checking are read errors.
pub async fn retrieve(plan: &BuildPlan) -> Result<Vec<u8>, ArtifactError> {
  let path = &plan.output_path;
  let exists = tokio::fs::try_exists(path).await.map_err(|source| ArtifactError::Read {
    path: path.clone(),
    source,
  })?;
  if !exists {
    warn!(path = %path.display(), "artifact missing after build");
    return Err(ArtifactError::NotFound { path: path.clone() });
  }

  if plan.mode == BuildMode::Shellcode {
    return Err(ArtifactError::NotImplemented(plan.mode));
  }

  let bytes = tokio::fs::read(path).await.map_err(|source| ArtifactError::Read {
    path: path.clone(),
    source,
  })?;
  debug!(path = %path.display(), size = bytes.len(), "read artifact");
  Ok(bytes)
}
