//! Install state machine

use crate::launch::LaunchState;
use crate::resume::{ResumeGate, ResumeOutcome};
use hotswap_config::Layout;
use hotswap_deploy::{Deployment, DeploymentEngine};
use hotswap_errors::{Error, InstallError};
use hotswap_events::{AppEvent, EventEmitter, EventSender, FailureContext, InstallEvent};
use hotswap_platform::{fs, ConfirmationProbe, Extractor, NativeBridge, PreInstallVerdict};
use hotswap_state::MetadataStore;
use hotswap_types::{
    DownloadedPackage, InstallDefaults, InstallMode, InstallOptions, InstallPhase,
    PackageMetadata, ResolvedInstall,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Native and extraction capabilities the orchestrator drives
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn Extractor>,
    pub bridge: Arc<dyn NativeBridge>,
    pub probe: Arc<dyn ConfirmationProbe>,
}

/// Result of a committed install
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Record now occupying the current slot
    pub package: PackageMetadata,
    pub deployment: Deployment,
    pub install_mode: InstallMode,
}

/// One install attempt. Each variant is a state; `advance` is its transition.
enum Attempt {
    Unzipping,
    Deploying { candidate: PathBuf },
    MetadataWritten { package: PackageMetadata, deployment: Deployment },
    PreInstallValidated { package: PackageMetadata, deployment: Deployment },
    Committed(InstallOutcome),
}

impl Attempt {
    fn phase(&self) -> InstallPhase {
        match self {
            Self::Unzipping => InstallPhase::Unzipping,
            Self::Deploying { .. } => InstallPhase::Deploying,
            Self::MetadataWritten { .. } => InstallPhase::MetadataWritten,
            Self::PreInstallValidated { .. } => InstallPhase::PreInstallValidated,
            Self::Committed(_) => InstallPhase::Committed,
        }
    }
}

/// Sequences a downloaded package through to native commit
pub struct InstallOrchestrator {
    layout: Layout,
    store: MetadataStore,
    engine: DeploymentEngine,
    extractor: Arc<dyn Extractor>,
    bridge: Arc<dyn NativeBridge>,
    probe: Arc<dyn ConfirmationProbe>,
    defaults: InstallDefaults,
    resume: ResumeGate,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for InstallOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallOrchestrator")
            .field("layout", &self.layout)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl EventEmitter for InstallOrchestrator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl InstallOrchestrator {
    /// Create an orchestrator over `layout`.
    ///
    /// `defaults` is the install policy used for every option a caller leaves
    /// unset.
    #[must_use]
    pub fn new(layout: &Layout, collaborators: Collaborators, defaults: InstallDefaults) -> Self {
        let store = MetadataStore::new(layout).with_probe(collaborators.probe.clone());
        Self {
            layout: layout.clone(),
            store,
            engine: DeploymentEngine::new(layout),
            extractor: collaborators.extractor,
            bridge: collaborators.bridge,
            probe: collaborators.probe,
            defaults,
            resume: ResumeGate::default(),
            tx: None,
        }
    }

    /// Content shipped inside the binary, used as the diff base before any
    /// update has been installed.
    #[must_use]
    pub fn with_binary_base(mut self, base: Option<PathBuf>) -> Self {
        self.engine = self.engine.with_binary_base(base);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.store = self.store.with_event_sender(tx.clone());
        self.engine = self.engine.with_event_sender(tx.clone());
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn defaults(&self) -> &InstallDefaults {
        &self.defaults
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// # Errors
    ///
    /// Returns a `StateError` if the current record cannot be read.
    pub async fn current_package(&self) -> Result<Option<PackageMetadata>, Error> {
        self.store.read_current().await
    }

    /// # Errors
    ///
    /// Returns a `StateError` if the previous record cannot be read.
    pub async fn previous_package(&self) -> Result<Option<PackageMetadata>, Error> {
        self.store.read_previous().await
    }

    /// Whether the native layer has marked `package_hash` as rolled back
    pub async fn is_failed_update(&self, package_hash: &str) -> bool {
        self.probe.is_failed_update(package_hash).await
    }

    /// Install a downloaded package.
    ///
    /// On success the package is the current record and the native layer has
    /// committed it with the resolved install mode and rollback timeout.
    ///
    /// # Errors
    ///
    /// Returns the error of the stage that failed:
    /// `InstallError::PreviouslyFailed`, `ExtractionFailed`, `DeploymentFailed`,
    /// `MetadataWriteFailed`, `PreInstallRejected` or `NativeCommitFailed`.
    /// A pre-install rejection leaves the new record in the current slot.
    pub async fn install(
        &self,
        package: &DownloadedPackage,
        options: InstallOptions,
    ) -> Result<InstallOutcome, Error> {
        let package_hash = package.package_hash().to_string();
        let resolved = options.resolve(&self.defaults);

        tracing::info!(
            package_hash = %package_hash,
            install_mode = %resolved.install_mode,
            "installing package"
        );
        self.emit(AppEvent::Install(InstallEvent::Started {
            package_hash: package_hash.clone(),
            install_mode: resolved.install_mode,
        }));

        let mut attempt = Attempt::Unzipping;
        loop {
            let phase = attempt.phase();
            self.emit_install_phase(&package_hash, phase);

            if let Attempt::Committed(outcome) = attempt {
                self.emit(AppEvent::Install(InstallEvent::Committed {
                    package_hash,
                    install_mode: outcome.install_mode,
                    rollback_timeout: resolved.rollback_timeout,
                }));
                return Ok(outcome);
            }

            attempt = match self.advance(attempt, package, &resolved).await {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!(
                        package_hash = %package_hash,
                        phase = %phase,
                        error = %err,
                        "install failed"
                    );
                    self.emit_install_phase(&package_hash, InstallPhase::Failed);
                    self.emit(AppEvent::Install(InstallEvent::Failed {
                        package_hash,
                        phase,
                        failure: FailureContext::from_error(&err),
                    }));
                    return Err(err);
                }
            };
        }
    }

    async fn advance(
        &self,
        attempt: Attempt,
        downloaded: &DownloadedPackage,
        resolved: &ResolvedInstall,
    ) -> Result<Attempt, Error> {
        match attempt {
            Attempt::Unzipping => self.unzip(downloaded).await,
            Attempt::Deploying { candidate } => self.deploy(downloaded, &candidate).await,
            Attempt::MetadataWritten {
                package,
                deployment,
            } => self.validate(package, deployment).await,
            Attempt::PreInstallValidated {
                package,
                deployment,
            } => self.commit(package, deployment, resolved).await,
            Attempt::Committed(outcome) => Ok(Attempt::Committed(outcome)),
        }
    }

    async fn unzip(&self, package: &DownloadedPackage) -> Result<Attempt, Error> {
        let package_hash = package.package_hash();
        if self.probe.is_failed_update(package_hash).await {
            return Err(InstallError::PreviouslyFailed {
                package_hash: package_hash.to_string(),
            }
            .into());
        }

        // Never resume a previous extraction
        let workspace = self.layout.unzipped_dir();
        fs::remove_path(&workspace)
            .await
            .map_err(|e| extraction_failed(&e))?;
        self.extractor
            .unzip(&package.archive_path, &workspace)
            .await
            .map_err(|e| extraction_failed(&e))?;

        Ok(Attempt::Deploying {
            candidate: workspace,
        })
    }

    async fn deploy(
        &self,
        package: &DownloadedPackage,
        candidate: &Path,
    ) -> Result<Attempt, Error> {
        let current = self.store.read_current().await?;
        let deployment = self
            .engine
            .deploy(candidate, package.package_hash(), current.as_ref())
            .await?;

        if let Err(e) = fs::remove_path(candidate).await {
            self.emit_warning_with_context("could not remove unzip workspace", e.to_string());
        }

        let record = PackageMetadata::from_remote(&package.remote, deployment.path.clone());
        // A generation that never started is dropped, not kept as the fallback
        match &current {
            Some(outgoing) if self.probe.is_pending(&outgoing.package_hash).await => {
                tracing::info!(
                    package_hash = %outgoing.package_hash,
                    "replacing pending package; previous record kept"
                );
            }
            _ => self
                .store
                .backup_current_to_previous()
                .await
                .map_err(|e| metadata_write_failed(&e))?,
        }
        self.store
            .write_current(&record)
            .await
            .map_err(|e| metadata_write_failed(&e))?;

        Ok(Attempt::MetadataWritten {
            package: record,
            deployment,
        })
    }

    async fn validate(
        &self,
        package: PackageMetadata,
        deployment: Deployment,
    ) -> Result<Attempt, Error> {
        match self.bridge.pre_install(&deployment.path).await {
            Ok(PreInstallVerdict::Accepted) => Ok(Attempt::PreInstallValidated {
                package,
                deployment,
            }),
            Ok(PreInstallVerdict::Rejected { reason }) => {
                Err(InstallError::PreInstallRejected { reason }.into())
            }
            Err(e) => Err(InstallError::PreInstallRejected {
                reason: e.to_string(),
            }
            .into()),
        }
    }

    async fn commit(
        &self,
        package: PackageMetadata,
        deployment: Deployment,
        resolved: &ResolvedInstall,
    ) -> Result<Attempt, Error> {
        self.bridge
            .commit(
                &deployment.path,
                resolved.rollback_timeout,
                resolved.install_mode,
            )
            .await
            .map_err(|e| InstallError::NativeCommitFailed {
                message: e.to_string(),
            })?;

        // A new commit supersedes whatever was waiting for a resume
        if resolved.install_mode == InstallMode::OnNextResume {
            self.resume
                .schedule(&package.package_hash, resolved.minimum_background_duration)
                .await;
            self.emit(AppEvent::Install(InstallEvent::ResumeScheduled {
                package_hash: package.package_hash.clone(),
                minimum_background: resolved.minimum_background_duration,
            }));
        } else {
            self.resume.clear().await;
        }

        Ok(Attempt::Committed(InstallOutcome {
            package,
            deployment,
            install_mode: resolved.install_mode,
        }))
    }

    /// Record that the host has moved to the background
    pub async fn on_background(&self) {
        self.resume.backgrounded().await;
    }

    /// Host came back to the foreground.
    ///
    /// Applies a pending `ON_NEXT_RESUME` install when the app stayed in the
    /// background for at least the minimum duration.
    ///
    /// # Errors
    ///
    /// Returns a `PlatformError` if the reload fails. The install stays pending.
    pub async fn on_foreground(&self) -> Result<ResumeOutcome, Error> {
        let outcome = self.resume.foregrounded(self.bridge.as_ref()).await?;
        match &outcome {
            ResumeOutcome::Applied { package_hash } => {
                self.emit(AppEvent::Install(InstallEvent::ResumeApplied {
                    package_hash: package_hash.clone(),
                }));
            }
            ResumeOutcome::Deferred {
                package_hash,
                background,
                minimum_background,
            } => {
                self.emit(AppEvent::Install(InstallEvent::ResumeDeferred {
                    package_hash: package_hash.clone(),
                    background: *background,
                    minimum_background: *minimum_background,
                }));
            }
            ResumeOutcome::NothingPending => {}
        }
        Ok(outcome)
    }

    /// Hash of the generation waiting for a resume, if any
    pub async fn pending_resume(&self) -> Option<String> {
        self.resume.pending_hash().await
    }

    /// Reload the application now. Restarts are never gated on background time.
    ///
    /// # Errors
    ///
    /// Returns a `PlatformError` if the bridge cannot reload.
    pub async fn restart_application(&self) -> Result<(), Error> {
        self.resume.clear().await;
        self.bridge.reload().await?;

        let package_hash = self.store.read_current().await?.map(|p| p.package_hash);
        self.emit(AppEvent::Install(InstallEvent::RestartRequested { package_hash }));
        Ok(())
    }

    /// The running generation is healthy; cancel any pending rollback.
    ///
    /// # Errors
    ///
    /// Returns a `PlatformError` if the bridge call fails, or a `StateError`
    /// if the current record cannot be read afterwards.
    pub async fn notify_application_ready(&self) -> Result<(), Error> {
        self.bridge.notify_ready().await?;

        let package_hash = self.store.read_current().await?.map(|p| p.package_hash);
        tracing::info!(package_hash = ?package_hash, "application ready");
        self.emit(AppEvent::Install(InstallEvent::ApplicationReady { package_hash }));
        Ok(())
    }

    /// Bring the metadata in line with what the native layer launched.
    ///
    /// When the current generation has been marked failed, the previous record
    /// is restored into the current slot, or the slot is cleared when there is
    /// no previous record and the binary's own content is running.
    ///
    /// # Errors
    ///
    /// Returns a `StateError` if either record cannot be read or rewritten.
    pub async fn reconcile_launch(&self) -> Result<LaunchState, Error> {
        self.emit_operation_started("launch reconciliation");
        let result = self.reconcile().await;
        match &result {
            Ok(_) => self.emit_operation_completed("launch reconciliation", true),
            Err(e) => self.emit_operation_failed("launch reconciliation", e.to_string()),
        }
        result
    }

    async fn reconcile(&self) -> Result<LaunchState, Error> {
        let Some(current) = self.store.read_current().await? else {
            return Ok(LaunchState::NoPackage);
        };

        if current.failed_install {
            let restored = self.store.restore_previous_to_current().await?;
            if restored.is_none() {
                self.store.clear_current().await?;
            }

            tracing::warn!(
                failed_hash = %current.package_hash,
                restored_hash = ?restored.as_ref().map(|p| &p.package_hash),
                "rolled back failed package"
            );
            self.emit(AppEvent::Install(InstallEvent::RolledBack {
                failed_hash: current.package_hash.clone(),
                restored_hash: restored.as_ref().map(|p| p.package_hash.clone()),
            }));
            return Ok(LaunchState::RolledBack {
                failed: current,
                restored,
            });
        }

        if current.is_first_run {
            Ok(LaunchState::FirstRun(current))
        } else {
            Ok(LaunchState::Running(current))
        }
    }
}

fn extraction_failed(err: &dyn std::fmt::Display) -> Error {
    InstallError::ExtractionFailed {
        message: err.to_string(),
    }
    .into()
}

fn metadata_write_failed(err: &Error) -> Error {
    InstallError::MetadataWriteFailed {
        message: err.to_string(),
    }
    .into()
}
