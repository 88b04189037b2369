use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventMeta, EventSource};
use hotswap_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, e.g. `install.pre_install_rejected`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod deploy;
pub mod general;
pub mod install;
pub mod state;
pub mod sync;

pub use deploy::*;
pub use general::*;
pub use install::*;
pub use state::*;
pub use sync::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Warnings, errors and generic operation markers
    General(GeneralEvent),

    /// Sync coordinator progress
    Sync(SyncEvent),

    /// Install orchestration and launch reconciliation
    Install(InstallEvent),

    /// File tree generation
    Deploy(DeployEvent),

    /// Metadata slot changes
    State(StateEvent),
}

impl AppEvent {
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Sync(_) => EventSource::SYNC,
            Self::Install(_) => EventSource::INSTALL,
            Self::Deploy(_) => EventSource::DEPLOY,
            Self::State(_) => EventSource::STATE,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::OperationFailed { .. })
            | Self::Sync(SyncEvent::Failed { .. })
            | Self::Install(InstallEvent::Failed { .. })
            | Self::Deploy(DeployEvent::Failed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Install(InstallEvent::RolledBack { .. })
            | Self::State(StateEvent::MetadataCorrupt { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Sync(SyncEvent::StatusChanged { .. })
            | Self::Install(InstallEvent::PhaseEntered { .. } | InstallEvent::ResumeDeferred { .. })
            | Self::Deploy(DeployEvent::FilesRemoved { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "hotswap::events::general",
            Self::Sync(_) => "hotswap::events::sync",
            Self::Install(_) => "hotswap::events::install",
            Self::Deploy(_) => "hotswap::events::deploy",
            Self::State(_) => "hotswap::events::state",
        }
    }

    /// Package hash this event concerns, when there is one
    #[must_use]
    pub fn package_hash(&self) -> Option<&str> {
        match self {
            Self::Sync(event) => event.package_hash(),
            Self::Install(event) => event.package_hash(),
            Self::Deploy(event) => Some(event.package_hash()),
            Self::State(event) => event.package_hash(),
            Self::General(_) => None,
        }
    }

    /// Build the metadata envelope used when the event is logged
    #[must_use]
    pub fn meta(&self) -> EventMeta {
        let meta = EventMeta::new(EventLevel::from(self.log_level()), self.event_source());
        match self.package_hash() {
            Some(hash) => meta.with_correlation_id(hash),
            None => meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotswap_errors::InstallError;
    use hotswap_types::InstallPhase;

    #[test]
    fn failure_context_carries_error_code() {
        let err = InstallError::PreInstallRejected {
            reason: "signature".into(),
        };
        let failure = FailureContext::from_error(&err);
        assert_eq!(failure.code.as_deref(), Some("install.pre_install_rejected"));
        assert!(!failure.retryable);
    }

    #[test]
    fn events_serialize_with_domain_tag() {
        let event = AppEvent::Install(InstallEvent::PhaseEntered {
            package_hash: "abc".into(),
            phase: InstallPhase::Deploying,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "install");
        assert_eq!(json["event"]["type"], "PhaseEntered");
        assert_eq!(event.meta().correlation_id.as_deref(), Some("abc"));
    }
}
