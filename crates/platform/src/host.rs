//! File-backed reference host
//!
//! Stands in for the native layer when the engine is driven from the CLI. It
//! keeps the active generation, a staged commit and the confirmation
//! bookkeeping in one JSON file next to the package metadata. A generation
//! that was started and never confirmed with `notify_ready` is reverted on
//! the following launch, the way a real host's rollback timer would. A
//! confirmation that arrives after the commit's rollback timeout counts as
//! no confirmation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hotswap_errors::PlatformError;
use hotswap_types::InstallMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::bridge::{ConfirmationProbe, NativeBridge, PreInstallVerdict};
use crate::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostState {
    /// Generation the host is running
    active: Option<PathBuf>,
    /// Generation that was running before `active`
    fallback: Option<PathBuf>,
    /// Committed but not yet started
    staged: Option<StagedCommit>,
    /// Hash started and not yet confirmed
    unconfirmed: Option<String>,
    #[serde(default)]
    failed_hashes: Vec<String>,
    activated_at: Option<DateTime<Utc>>,
    /// Confirmation deadline of the unconfirmed generation
    rollback_timeout_ms: Option<u64>,
    #[serde(default)]
    reloads: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StagedCommit {
    generation: PathBuf,
    install_mode: InstallMode,
    rollback_timeout_ms: Option<u64>,
}

/// What a launch did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    /// Hash reverted because it never confirmed
    pub rolled_back: Option<String>,
    /// Hash started by this launch
    pub activated: Option<String>,
    /// Generation running after the launch, `None` for the binary's own content
    pub active: Option<PathBuf>,
}

#[derive(Debug)]
pub struct HostBridge {
    state_file: PathBuf,
    lock: Mutex<()>,
}

impl HostBridge {
    #[must_use]
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
            lock: Mutex::new(()),
        }
    }

    /// Simulate a cold start of the host application.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be read or written.
    pub async fn launch(&self) -> Result<LaunchReport, PlatformError> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        let mut report = LaunchReport::default();

        // The previous run ended without confirming its generation
        if let Some(hash) = state.unconfirmed.take() {
            tracing::warn!(package_hash = %hash, "generation never confirmed; reverting");
            state.failed_hashes.push(hash.clone());
            state.active = state.fallback.take();
            state.activated_at = None;
            state.rollback_timeout_ms = None;
            report.rolled_back = Some(hash);
        }

        if let Some(staged) = state.staged.take() {
            report.activated = Some(activate(&mut state, staged));
        }

        report.active.clone_from(&state.active);
        self.store(&state).await?;
        Ok(report)
    }

    /// Generation the host would run right now
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be read.
    pub async fn active_generation(&self) -> Result<Option<PathBuf>, PlatformError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.active)
    }

    async fn load(&self) -> Result<HostState, PlatformError> {
        match tokio::fs::read(&self.state_file).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| bridge_err("load", &e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostState::default()),
            Err(e) => Err(bridge_err("load", &e)),
        }
    }

    async fn store(&self, state: &HostState) -> Result<(), PlatformError> {
        let bytes = serde_json::to_vec_pretty(state).map_err(|e| bridge_err("store", &e))?;
        fs::atomic_write(&self.state_file, &bytes)
            .await
            .map_err(|e| bridge_err("store", &e))
    }
}

fn activate(state: &mut HostState, staged: StagedCommit) -> String {
    let hash = generation_hash(&staged.generation);
    state.fallback = state.active.replace(staged.generation);
    state.unconfirmed = Some(hash.clone());
    state.activated_at = Some(Utc::now());
    state.rollback_timeout_ms = staged.rollback_timeout_ms;
    hash
}

fn deadline_passed(state: &HostState) -> bool {
    let (Some(at), Some(ms)) = (state.activated_at, state.rollback_timeout_ms) else {
        return false;
    };
    i64::try_from(ms)
        .ok()
        .and_then(chrono::TimeDelta::try_milliseconds)
        .is_some_and(|timeout| Utc::now() - at >= timeout)
}

fn generation_hash(generation: &Path) -> String {
    generation
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn bridge_err(operation: &str, err: &dyn std::fmt::Display) -> PlatformError {
    PlatformError::BridgeCallFailed {
        operation: operation.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl NativeBridge for HostBridge {
    async fn pre_install(&self, generation: &Path) -> Result<PreInstallVerdict, PlatformError> {
        let mut entries = match tokio::fs::read_dir(generation).await {
            Ok(entries) => entries,
            Err(e) => {
                return Ok(PreInstallVerdict::Rejected {
                    reason: format!("generation {} unreadable: {e}", generation.display()),
                })
            }
        };
        match entries.next_entry().await {
            Ok(Some(_)) => Ok(PreInstallVerdict::Accepted),
            Ok(None) => Ok(PreInstallVerdict::Rejected {
                reason: "generation directory is empty".to_string(),
            }),
            Err(e) => Err(bridge_err("pre_install", &e)),
        }
    }

    async fn commit(
        &self,
        generation: &Path,
        rollback_timeout: Option<Duration>,
        install_mode: InstallMode,
    ) -> Result<(), PlatformError> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        let staged = StagedCommit {
            generation: generation.to_path_buf(),
            install_mode,
            rollback_timeout_ms: rollback_timeout
                .map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
        };

        if install_mode == InstallMode::Immediate {
            let hash = activate(&mut state, staged);
            state.reloads += 1;
            tracing::info!(package_hash = %hash, "generation activated immediately");
        } else {
            tracing::info!(mode = %install_mode, "generation staged");
            state.staged = Some(staged);
        }
        self.store(&state).await
    }

    async fn reload(&self) -> Result<(), PlatformError> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        if let Some(staged) = state.staged.take() {
            activate(&mut state, staged);
        }
        state.reloads += 1;
        self.store(&state).await
    }

    async fn notify_ready(&self) -> Result<(), PlatformError> {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;
        if let Some(hash) = state.unconfirmed.as_deref() {
            if deadline_passed(&state) {
                tracing::warn!(package_hash = %hash, "confirmed after the rollback timeout");
                return Ok(());
            }
            tracing::debug!(package_hash = %hash, "generation confirmed");
        }
        state.unconfirmed = None;
        state.activated_at = None;
        state.rollback_timeout_ms = None;
        self.store(&state).await
    }
}

#[async_trait]
impl ConfirmationProbe for HostBridge {
    async fn is_first_run(&self, package_hash: &str) -> bool {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(state) => state.unconfirmed.as_deref() == Some(package_hash),
            Err(e) => {
                tracing::warn!(error = %e, "host state unreadable");
                false
            }
        }
    }

    async fn is_failed_update(&self, package_hash: &str) -> bool {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(state) => state.failed_hashes.iter().any(|h| h == package_hash),
            Err(e) => {
                tracing::warn!(error = %e, "host state unreadable");
                false
            }
        }
    }

    async fn is_pending(&self, package_hash: &str) -> bool {
        let _guard = self.lock.lock().await;
        match self.load().await {
            Ok(state) => state
                .staged
                .is_some_and(|staged| generation_hash(&staged.generation) == package_hash),
            Err(e) => {
                tracing::warn!(error = %e, "host state unreadable");
                false
            }
        }
    }
}
