//! Interfaces to the native layer

use async_trait::async_trait;
use hotswap_errors::PlatformError;
use hotswap_types::InstallMode;
use std::path::Path;
use std::time::Duration;

/// Answer of the native pre-install check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreInstallVerdict {
    Accepted,
    Rejected { reason: String },
}

/// Native install bridge
///
/// Owns the binary swap, the app reload and the post-commit confirmation
/// timer. The engine only supplies parameters.
#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Validate a finalized generation before it is committed
    async fn pre_install(&self, generation: &Path) -> Result<PreInstallVerdict, PlatformError>;

    /// Point the host at `generation`.
    ///
    /// `rollback_timeout` of `None` means no confirmation deadline.
    async fn commit(
        &self,
        generation: &Path,
        rollback_timeout: Option<Duration>,
        install_mode: InstallMode,
    ) -> Result<(), PlatformError>;

    /// Reload the application so a staged generation starts running
    async fn reload(&self) -> Result<(), PlatformError>;

    /// The running generation is healthy; cancel any pending rollback
    async fn notify_ready(&self) -> Result<(), PlatformError>;
}

/// Confirmation protocol consulted when reading metadata
#[async_trait]
pub trait ConfirmationProbe: Send + Sync {
    async fn is_first_run(&self, package_hash: &str) -> bool;

    async fn is_failed_update(&self, package_hash: &str) -> bool;

    /// Committed for a later restart or resume and not started yet
    async fn is_pending(&self, package_hash: &str) -> bool;
}
