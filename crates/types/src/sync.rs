//! Sync status vocabulary and the coordinator's internal state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status reported to sync observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    UpToDate,
    UpdateInstalled,
    UpdateIgnored,
    Error,
    SyncInProgress,
    CheckingForUpdate,
    AwaitingUserAction,
    DownloadingPackage,
    InstallingUpdate,
}

impl SyncStatus {
    /// Terminal statuses end a sync; nothing follows them on the stream.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::UpToDate
                | Self::UpdateInstalled
                | Self::UpdateIgnored
                | Self::Error
                | Self::SyncInProgress
        )
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UpToDate => "UP_TO_DATE",
            Self::UpdateInstalled => "UPDATE_INSTALLED",
            Self::UpdateIgnored => "UPDATE_IGNORED",
            Self::Error => "ERROR",
            Self::SyncInProgress => "SYNC_IN_PROGRESS",
            Self::CheckingForUpdate => "CHECKING_FOR_UPDATE",
            Self::AwaitingUserAction => "AWAITING_USER_ACTION",
            Self::DownloadingPackage => "DOWNLOADING_PACKAGE",
            Self::InstallingUpdate => "INSTALLING_UPDATE",
        };
        f.write_str(s)
    }
}

/// Coordinator state; stored as a `u8` in an atomic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SyncState {
    UpToDate = 0,
    Checking = 1,
    Downloading = 2,
    Installing = 3,
    WaitingForUser = 4,
    SyncInProgress = 5,
    Error = 6,
}

impl SyncState {
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Checking,
            2 => Self::Downloading,
            3 => Self::Installing,
            4 => Self::WaitingForUser,
            5 => Self::SyncInProgress,
            6 => Self::Error,
            _ => Self::UpToDate,
        }
    }

    /// Idle states accept a new sync.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::UpToDate | Self::Error)
    }
}

impl From<SyncState> for u8 {
    fn from(state: SyncState) -> Self {
        state as u8
    }
}
