//! Diff manifest detection

use hotswap_errors::{Error, InstallError};
use hotswap_types::{DiffManifest, DIFF_MANIFEST_FILE};
use std::io::ErrorKind;
use std::path::Path;

/// What an unpacked candidate turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateKind {
    Clean,
    Diff(DiffManifest),
}

/// Inspect a candidate directory for a diff manifest.
///
/// A missing manifest means a clean candidate. So does a manifest that
/// cannot be read for any other reason: clean deployment is always valid.
///
/// # Errors
///
/// Returns `InstallError::DeploymentFailed` if the manifest was read but is
/// not valid JSON.
pub async fn detect(candidate: &Path) -> Result<CandidateKind, Error> {
    let path = candidate.join(DIFF_MANIFEST_FILE);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(CandidateKind::Clean),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "diff manifest unreadable; deploying clean");
            return Ok(CandidateKind::Clean);
        }
    };

    let manifest: DiffManifest =
        serde_json::from_slice(&bytes).map_err(|e| InstallError::DeploymentFailed {
            message: format!("invalid diff manifest {}: {e}", path.display()),
        })?;
    Ok(CandidateKind::Diff(manifest))
}
