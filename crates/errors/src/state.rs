//! Package metadata store error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StateError {
    #[error("package record {path} is corrupt: {message}")]
    MetadataCorrupt { path: String, message: String },

    #[error("failed to read package record {path}: {message}")]
    MetadataReadFailed { path: String, message: String },

    #[error("failed to write package record {path}: {message}")]
    MetadataWriteFailed { path: String, message: String },
}

impl UserFacingError for StateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MetadataCorrupt { .. } => Some(
                "The update history is unreadable; inspect or remove the package record before syncing.",
            ),
            Self::MetadataReadFailed { .. } | Self::MetadataWriteFailed { .. } => {
                Some("Ensure the data directory is readable and writable.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::MetadataCorrupt { .. } => "state.metadata_corrupt",
            Self::MetadataReadFailed { .. } => "state.metadata_read_failed",
            Self::MetadataWriteFailed { .. } => "state.metadata_write_failed",
        };
        Some(code)
    }
}
