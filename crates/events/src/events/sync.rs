use serde::{Deserialize, Serialize};

use super::FailureContext;
use hotswap_types::SyncStatus;

/// Events emitted by the sync coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// A sync was accepted and started
    Started { deployment_key: String },

    /// A second sync arrived while one was running
    Rejected,

    /// Status reported to sync observers
    StatusChanged { status: SyncStatus },

    /// Server offered a package this binary can install
    UpdateAvailable {
        package_hash: String,
        label: String,
        is_mandatory: bool,
        package_size: u64,
    },

    /// Nothing to install, with the reason
    UpToDate { reason: String },

    /// User answered the update prompt
    PromptAnswered { package_hash: String, accepted: bool },

    DownloadStarted { package_hash: String, url: String },

    DownloadCompleted { package_hash: String, bytes: u64 },

    /// Sync reached a terminal status
    Completed { status: SyncStatus },

    Failed { failure: FailureContext },
}

impl SyncEvent {
    #[must_use]
    pub fn package_hash(&self) -> Option<&str> {
        match self {
            Self::UpdateAvailable { package_hash, .. }
            | Self::PromptAnswered { package_hash, .. }
            | Self::DownloadStarted { package_hash, .. }
            | Self::DownloadCompleted { package_hash, .. } => Some(package_hash),
            _ => None,
        }
    }
}
