//! Errors raised by host collaborators (native bridge, extraction, filesystem)

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors that can occur while talking to the host platform
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("native bridge call {operation} failed: {message}")]
    BridgeCallFailed { operation: String, message: String },

    #[error("filesystem operation failed: {operation} - {message}")]
    FilesystemOperationFailed { operation: String, message: String },

    #[error("archive extraction failed: {message}")]
    ExtractionFailed { message: String },
}

impl UserFacingError for PlatformError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::FilesystemOperationFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::BridgeCallFailed { .. } => "platform.bridge_call_failed",
            Self::FilesystemOperationFailed { .. } => "platform.filesystem_operation_failed",
            Self::ExtractionFailed { .. } => "platform.extraction_failed",
        };
        Some(code)
    }
}
