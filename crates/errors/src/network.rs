//! Update-check and download error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("update check failed: {message}")]
    CheckFailed { message: String },

    #[error("malformed update check response: {message}")]
    MalformedResponse { message: String },

    #[error("download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::CheckFailed { .. } => {
                Some("Check the update server URL and network connectivity, then sync again.")
            }
            Self::MalformedResponse { .. } => {
                Some("The update server returned an unexpected payload; verify the server version.")
            }
            Self::DownloadFailed { .. } | Self::InvalidUrl(_) => {
                Some("The package could not be fetched; the running version is unchanged.")
            }
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::CheckFailed { .. } | Self::DownloadFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::CheckFailed { .. } => "network.check_failed",
            Self::MalformedResponse { .. } => "network.malformed_response",
            Self::DownloadFailed { .. } => "network.download_failed",
            Self::InvalidUrl(_) => "network.invalid_url",
        };
        Some(code)
    }
}
