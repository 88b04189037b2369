use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;
use hotswap_types::{InstallMode, InstallPhase};

/// Events emitted by the install orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstallEvent {
    Started {
        package_hash: String,
        install_mode: InstallMode,
    },

    PhaseEntered {
        package_hash: String,
        phase: InstallPhase,
    },

    /// Native layer accepted the new generation
    Committed {
        package_hash: String,
        install_mode: InstallMode,
        rollback_timeout: Option<Duration>,
    },

    Failed {
        package_hash: String,
        phase: InstallPhase,
        failure: FailureContext,
    },

    /// Activation is waiting for the next resume
    ResumeScheduled {
        package_hash: String,
        minimum_background: Duration,
    },

    /// Resume happened after enough background time; reload requested
    ResumeApplied { package_hash: String },

    /// Resume happened too soon; activation stays pending
    ResumeDeferred {
        package_hash: String,
        background: Duration,
        minimum_background: Duration,
    },

    /// Launch found the current package marked failed
    RolledBack {
        failed_hash: String,
        restored_hash: Option<String>,
    },

    /// Running generation confirmed itself healthy
    ApplicationReady { package_hash: Option<String> },

    /// Host reload requested outside the resume gate
    RestartRequested { package_hash: Option<String> },
}

impl InstallEvent {
    #[must_use]
    pub fn package_hash(&self) -> Option<&str> {
        match self {
            Self::Started { package_hash, .. }
            | Self::PhaseEntered { package_hash, .. }
            | Self::Committed { package_hash, .. }
            | Self::Failed { package_hash, .. }
            | Self::ResumeScheduled { package_hash, .. }
            | Self::ResumeApplied { package_hash }
            | Self::ResumeDeferred { package_hash, .. } => Some(package_hash),
            Self::RolledBack { failed_hash, .. } => Some(failed_hash),
            Self::ApplicationReady { package_hash } | Self::RestartRequested { package_hash } => {
                package_hash.as_deref()
            }
        }
    }
}
