//! Install pipeline error types
//!
//! One variant per pipeline stage. Callers branch on the variant, so these are
//! never folded into a generic failure.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum InstallError {
    #[error("could not unzip package: {message}")]
    ExtractionFailed { message: String },

    #[error("deployment failed: {message}")]
    DeploymentFailed { message: String },

    #[error("failed to write package metadata: {message}")]
    MetadataWriteFailed { message: String },

    #[error("pre-install validation rejected the package: {reason}")]
    PreInstallRejected { reason: String },

    #[error("native commit failed: {message}")]
    NativeCommitFailed { message: String },

    #[error("package {package_hash} previously failed to install")]
    PreviouslyFailed { package_hash: String },
}

impl UserFacingError for InstallError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ExtractionFailed { .. } => {
                Some("The downloaded file is not a valid update archive.")
            }
            Self::PreInstallRejected { .. } => Some(
                "The package is recorded as current but was never activated.",
            ),
            Self::PreviouslyFailed { .. } => {
                Some("Publish a new release; rolled back packages are never reinstalled.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DeploymentFailed { .. } | Self::MetadataWriteFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ExtractionFailed { .. } => "install.extraction_failed",
            Self::DeploymentFailed { .. } => "install.deployment_failed",
            Self::MetadataWriteFailed { .. } => "install.metadata_write_failed",
            Self::PreInstallRejected { .. } => "install.pre_install_rejected",
            Self::NativeCommitFailed { .. } => "install.native_commit_failed",
            Self::PreviouslyFailed { .. } => "install.previously_failed",
        };
        Some(code)
    }
}
