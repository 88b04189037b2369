//! Structured logging integration for events
//!
//! Every domain event is forwarded to tracing at the level it declares, with
//! its source, correlation id and JSON payload as fields.

use hotswap_events::{AppEvent, DeployEvent, GeneralEvent, InstallEvent, StateEvent, SyncEvent};
use tracing::{debug, error, info, trace, warn, Level};

/// Log an `AppEvent` through tracing
pub fn log_event_with_tracing(event: &AppEvent) {
    let meta = event.meta();
    let payload = serde_json::to_string(event).unwrap_or_default();
    let source = meta.source.as_str();
    let correlation = meta.correlation_id.as_deref();
    let message = summary(event);

    match meta.tracing_level() {
        Level::ERROR => error!(
            target: "hotswap::events",
            source, correlation = ?correlation, event = %payload, "{message}"
        ),
        Level::WARN => warn!(
            target: "hotswap::events",
            source, correlation = ?correlation, event = %payload, "{message}"
        ),
        Level::INFO => info!(
            target: "hotswap::events",
            source, correlation = ?correlation, event = %payload, "{message}"
        ),
        Level::DEBUG => debug!(
            target: "hotswap::events",
            source, correlation = ?correlation, event = %payload, "{message}"
        ),
        Level::TRACE => trace!(
            target: "hotswap::events",
            source, correlation = ?correlation, event = %payload, "{message}"
        ),
    }
}

/// One-line human description of an event
fn summary(event: &AppEvent) -> String {
    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) => format!("{message}: {context}"),
                None => message.clone(),
            },
            GeneralEvent::DebugLog { message, .. } => message.clone(),
            GeneralEvent::OperationStarted { operation } => {
                format!("{operation} started")
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                format!("{operation} finished (success: {success})")
            }
            GeneralEvent::OperationFailed { operation, error } => {
                format!("{operation} failed: {error}")
            }
        },
        AppEvent::Sync(sync) => match sync {
            SyncEvent::Started { deployment_key } => format!("Sync started for {deployment_key}"),
            SyncEvent::Rejected => "Sync already in progress".to_string(),
            SyncEvent::StatusChanged { status } => format!("Sync status {status}"),
            SyncEvent::UpdateAvailable {
                package_hash,
                label,
                is_mandatory,
                ..
            } => format!("Update {label} ({package_hash}) available, mandatory: {is_mandatory}"),
            SyncEvent::UpToDate { reason } => format!("Up to date: {reason}"),
            SyncEvent::PromptAnswered { accepted, .. } => {
                format!("Update prompt answered, accepted: {accepted}")
            }
            SyncEvent::DownloadStarted { url, .. } => format!("Downloading {url}"),
            SyncEvent::DownloadCompleted { bytes, .. } => format!("Downloaded {bytes} bytes"),
            SyncEvent::Completed { status } => format!("Sync finished with {status}"),
            SyncEvent::Failed { failure } => format!("Sync failed: {}", failure.message),
        },
        AppEvent::Install(install) => match install {
            InstallEvent::Started {
                package_hash,
                install_mode,
            } => format!("Installing {package_hash} ({install_mode})"),
            InstallEvent::PhaseEntered { phase, .. } => format!("Install phase {phase}"),
            InstallEvent::Committed { package_hash, .. } => format!("Committed {package_hash}"),
            InstallEvent::Failed { phase, failure, .. } => {
                format!("Install failed during {phase}: {}", failure.message)
            }
            InstallEvent::ResumeScheduled { package_hash, .. } => {
                format!("{package_hash} activates on next resume")
            }
            InstallEvent::ResumeApplied { package_hash } => {
                format!("{package_hash} activated on resume")
            }
            InstallEvent::ResumeDeferred { package_hash, .. } => {
                format!("{package_hash} stays pending; background too short")
            }
            InstallEvent::RolledBack {
                failed_hash,
                restored_hash,
            } => format!(
                "Rolled back {failed_hash} to {}",
                restored_hash.as_deref().unwrap_or("binary content")
            ),
            InstallEvent::ApplicationReady { .. } => "Application confirmed ready".to_string(),
            InstallEvent::RestartRequested { .. } => "Restart requested".to_string(),
        },
        AppEvent::Deploy(deploy) => match deploy {
            DeployEvent::Started { package_hash, kind } => {
                format!("Deploying {package_hash} ({kind})")
            }
            DeployEvent::BaseCopied { base, .. } => format!("Copied base {}", base.display()),
            DeployEvent::FilesRemoved { count, .. } => format!("Removed {count} deleted files"),
            DeployEvent::Completed { path, .. } => format!("Deployed to {}", path.display()),
            DeployEvent::Failed { failure, .. } => format!("Deploy failed: {}", failure.message),
        },
        AppEvent::State(state) => match state {
            StateEvent::BackedUp { package_hash } => format!("Backed up {package_hash}"),
            StateEvent::CurrentWritten { package_hash } => {
                format!("{package_hash} recorded as current")
            }
            StateEvent::Restored { package_hash } => format!("Restored {package_hash}"),
            StateEvent::CurrentCleared => "Current package cleared".to_string(),
            StateEvent::MetadataCorrupt { path, message } => {
                format!("Corrupt package record {}: {message}", path.display())
            }
        },
    }
}
