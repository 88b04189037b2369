use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;
use hotswap_types::DeploymentKind;

/// Events emitted while building a generation directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeployEvent {
    Started {
        package_hash: String,
        kind: DeploymentKind,
    },

    /// Diff base copied into the new generation
    BaseCopied {
        package_hash: String,
        base: PathBuf,
    },

    /// Diff deletions applied
    FilesRemoved { package_hash: String, count: usize },

    Completed {
        package_hash: String,
        kind: DeploymentKind,
        path: PathBuf,
    },

    Failed {
        package_hash: String,
        failure: FailureContext,
    },
}

impl DeployEvent {
    #[must_use]
    pub fn package_hash(&self) -> &str {
        match self {
            Self::Started { package_hash, .. }
            | Self::BaseCopied { package_hash, .. }
            | Self::FilesRemoved { package_hash, .. }
            | Self::Completed { package_hash, .. }
            | Self::Failed { package_hash, .. } => package_hash,
        }
    }
}
