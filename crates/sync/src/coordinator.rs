//! The sync state machine

use crate::options::SyncOptions;
use crate::prompt::UpdatePrompt;
use crate::stream::{StatusSink, SyncStream};
use hotswap_errors::Error;
use hotswap_events::{AppEvent, EventEmitter, EventSender, FailureContext, SyncEvent};
use hotswap_install::InstallOrchestrator;
use hotswap_net::{UpdateClient, UpdateQuery};
use hotswap_types::{DownloadedPackage, PackageMetadata, SyncState, SyncStatus};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Composes update check, download and install into one operation.
///
/// One coordinator per process. Wrap it in an [`Arc`] to call [`Self::sync`].
pub struct SyncCoordinator {
    client: Arc<dyn UpdateClient>,
    orchestrator: Arc<InstallOrchestrator>,
    prompt: Option<Arc<dyn UpdatePrompt>>,
    app_version: String,
    deployment_key: String,
    binary_content_dir: Option<PathBuf>,
    state: AtomicU8,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("app_version", &self.app_version)
            .field("deployment_key", &self.deployment_key)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for SyncCoordinator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

/// Claim on the coordinator for one pipeline; releases it on drop
struct InFlight {
    coordinator: Arc<SyncCoordinator>,
    end: SyncState,
}

impl InFlight {
    fn enter(&self, state: SyncState) {
        self.coordinator.state.store(state.into(), Ordering::SeqCst);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.coordinator
            .state
            .store(self.end.into(), Ordering::SeqCst);
    }
}

enum Decision {
    UpToDate(&'static str),
    Install(hotswap_types::RemotePackage),
}

impl SyncCoordinator {
    #[must_use]
    pub fn new(
        client: Arc<dyn UpdateClient>,
        orchestrator: Arc<InstallOrchestrator>,
        app_version: impl Into<String>,
        deployment_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            orchestrator,
            prompt: None,
            app_version: app_version.into(),
            deployment_key: deployment_key.into(),
            binary_content_dir: None,
            state: AtomicU8::new(SyncState::UpToDate.into()),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: Arc<dyn UpdatePrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Content shipped with the binary; its tree hash identifies the binary
    /// to the server while no update is installed.
    #[must_use]
    pub fn with_binary_content_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.binary_content_dir = dir;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::SeqCst))
    }

    #[must_use]
    pub fn orchestrator(&self) -> &InstallOrchestrator {
        &self.orchestrator
    }

    /// Start a sync.
    ///
    /// Must be called from within a tokio runtime. If a sync is already in
    /// flight the returned stream yields `SYNC_IN_PROGRESS` once and ends; the
    /// running sync is unaffected.
    #[must_use]
    pub fn sync(self: &Arc<Self>, options: SyncOptions) -> SyncStream {
        let (sink, outcome, stream) = SyncStream::channel();

        let Some(flight) = self.try_begin() else {
            tracing::debug!("sync requested while another is in flight");
            self.emit(AppEvent::Sync(SyncEvent::Rejected));
            let _ = sink.unbounded_send(SyncStatus::SyncInProgress);
            let _ = outcome.send(Ok(SyncStatus::SyncInProgress));
            return stream;
        };

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut flight = flight;
            let result = coordinator.run(options, &sink, &flight).await;

            let terminal = match &result {
                Ok(status) => *status,
                Err(err) => {
                    tracing::warn!(error = %err, "sync failed");
                    coordinator.emit(AppEvent::Sync(SyncEvent::Failed {
                        failure: FailureContext::from_error(err),
                    }));
                    SyncStatus::Error
                }
            };

            // Release before the terminal status so observers can sync again
            flight.end = if terminal == SyncStatus::Error {
                SyncState::Error
            } else {
                SyncState::UpToDate
            };
            drop(flight);

            coordinator.report(&sink, terminal);
            coordinator.emit(AppEvent::Sync(SyncEvent::Completed { status: terminal }));
            let _ = outcome.send(result);
        });

        stream
    }

    fn try_begin(self: &Arc<Self>) -> Option<InFlight> {
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                SyncState::from_u8(current)
                    .is_idle()
                    .then_some(SyncState::SyncInProgress.into())
            })
            .ok()?;
        Some(InFlight {
            coordinator: Arc::clone(self),
            end: SyncState::Error,
        })
    }

    fn report(&self, sink: &StatusSink, status: SyncStatus) {
        tracing::debug!(status = %status, "sync status");
        self.emit_sync_status(status);
        // Caller may have dropped the stream
        let _ = sink.unbounded_send(status);
    }

    fn transition(&self, sink: &StatusSink, flight: &InFlight, status: SyncStatus) {
        if let Some(state) = state_for(status) {
            flight.enter(state);
        }
        self.report(sink, status);
    }

    async fn run(
        &self,
        options: SyncOptions,
        sink: &StatusSink,
        flight: &InFlight,
    ) -> Result<SyncStatus, Error> {
        let deployment_key = options
            .deployment_key
            .clone()
            .unwrap_or_else(|| self.deployment_key.clone());
        self.emit(AppEvent::Sync(SyncEvent::Started {
            deployment_key: deployment_key.clone(),
        }));

        self.transition(sink, flight, SyncStatus::CheckingForUpdate);
        let current = self.orchestrator.current_package().await?;
        let query = UpdateQuery {
            deployment_key: deployment_key.clone(),
            app_version: self.app_version.clone(),
            package_hash: self.running_hash(current.as_ref()).await,
        };
        let response = self.client.check_for_update(&query).await?;
        response.validate()?;

        let remote = match self.decide(response, current.as_ref(), deployment_key).await {
            Decision::UpToDate(reason) => {
                tracing::info!(reason, "up to date");
                self.emit(AppEvent::Sync(SyncEvent::UpToDate {
                    reason: reason.to_string(),
                }));
                return Ok(SyncStatus::UpToDate);
            }
            Decision::Install(remote) => remote,
        };

        self.emit(AppEvent::Sync(SyncEvent::UpdateAvailable {
            package_hash: remote.package_hash.clone(),
            label: remote.label.clone(),
            is_mandatory: remote.is_mandatory,
            package_size: remote.package_size,
        }));

        if options.prompt_user {
            if let Some(prompt) = &self.prompt {
                self.transition(sink, flight, SyncStatus::AwaitingUserAction);
                let accepted = prompt.confirm(&remote).await;
                self.emit(AppEvent::Sync(SyncEvent::PromptAnswered {
                    package_hash: remote.package_hash.clone(),
                    accepted,
                }));
                if !accepted && !remote.is_mandatory {
                    return Ok(SyncStatus::UpdateIgnored);
                }
            } else {
                self.emit_warning("update prompt requested but none is configured");
            }
        }

        self.transition(sink, flight, SyncStatus::DownloadingPackage);
        self.emit(AppEvent::Sync(SyncEvent::DownloadStarted {
            package_hash: remote.package_hash.clone(),
            url: remote.download_url.clone(),
        }));
        let archive_path = self.client.download(&remote.download_url).await?;
        let bytes = tokio::fs::metadata(&archive_path)
            .await
            .map(|m| m.len())
            .unwrap_or_default();
        self.emit(AppEvent::Sync(SyncEvent::DownloadCompleted {
            package_hash: remote.package_hash.clone(),
            bytes,
        }));

        self.transition(sink, flight, SyncStatus::InstallingUpdate);
        let install = options
            .install
            .with_mandatory_policy(remote.is_mandatory, self.orchestrator.defaults());
        let package = DownloadedPackage {
            remote,
            archive_path,
        };
        let outcome = self.orchestrator.install(&package, install).await?;

        tracing::info!(
            package_hash = %outcome.package.package_hash,
            install_mode = %outcome.install_mode,
            "update installed"
        );
        Ok(SyncStatus::UpdateInstalled)
    }

    async fn decide(
        &self,
        response: hotswap_types::UpdateCheckResponse,
        current: Option<&PackageMetadata>,
        deployment_key: String,
    ) -> Decision {
        if !response.is_available {
            return Decision::UpToDate("no update available");
        }
        if !response.is_applicable_to(&self.app_version) {
            return Decision::UpToDate("update targets a different binary version");
        }
        if current.is_some_and(|c| c.package_hash == response.package_hash) {
            return Decision::UpToDate("offered package is already current");
        }
        if self
            .orchestrator
            .is_failed_update(&response.package_hash)
            .await
        {
            return Decision::UpToDate("offered package previously failed to install");
        }
        Decision::Install(response.into_remote(deployment_key))
    }

    /// Hash the server uses to identify what is running
    async fn running_hash(&self, current: Option<&PackageMetadata>) -> Option<String> {
        if let Some(current) = current {
            return Some(current.package_hash.clone());
        }
        let dir = self.binary_content_dir.as_deref()?;
        match hotswap_hash::hash_directory(dir).await {
            Ok(hash) => Some(hash.to_hex()),
            Err(e) => {
                self.emit_warning_with_context("could not hash binary content", e.to_string());
                None
            }
        }
    }
}

fn state_for(status: SyncStatus) -> Option<SyncState> {
    match status {
        SyncStatus::CheckingForUpdate => Some(SyncState::Checking),
        SyncStatus::AwaitingUserAction => Some(SyncState::WaitingForUser),
        SyncStatus::DownloadingPackage => Some(SyncState::Downloading),
        SyncStatus::InstallingUpdate => Some(SyncState::Installing),
        _ => None,
    }
}
