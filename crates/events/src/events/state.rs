use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata slot changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    /// Current record copied into the previous slot
    BackedUp { package_hash: String },

    CurrentWritten { package_hash: String },

    /// Previous record moved back into the current slot
    Restored { package_hash: String },

    /// Current slot removed; the binary's bundle runs next
    CurrentCleared,

    MetadataCorrupt { path: PathBuf, message: String },
}

impl StateEvent {
    #[must_use]
    pub fn package_hash(&self) -> Option<&str> {
        match self {
            Self::BackedUp { package_hash }
            | Self::CurrentWritten { package_hash }
            | Self::Restored { package_hash } => Some(package_hash),
            Self::CurrentCleared | Self::MetadataCorrupt { .. } => None,
        }
    }
}
