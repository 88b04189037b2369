//! Resume gate for `ON_NEXT_RESUME` installs

use hotswap_errors::Error;
use hotswap_platform::NativeBridge;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// What a foreground transition did with the pending install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    NothingPending,
    /// The app reloaded into the pending generation
    Applied { package_hash: String },
    /// Background time fell short; the old generation keeps running
    Deferred {
        package_hash: String,
        background: Duration,
        minimum_background: Duration,
    },
}

#[derive(Debug)]
struct PendingResume {
    package_hash: String,
    minimum_background: Duration,
}

#[derive(Debug, Default)]
struct GateState {
    pending: Option<PendingResume>,
    /// Set while the host is in the background, whether or not an install waits
    backgrounded_at: Option<Instant>,
}

/// At most one generation waits for a resume; a newer commit replaces it.
#[derive(Debug, Default)]
pub(crate) struct ResumeGate {
    state: Mutex<GateState>,
}

impl ResumeGate {
    pub(crate) async fn schedule(&self, package_hash: &str, minimum_background: Duration) {
        self.state.lock().await.pending = Some(PendingResume {
            package_hash: package_hash.to_string(),
            minimum_background,
        });
    }

    pub(crate) async fn clear(&self) {
        self.state.lock().await.pending.take();
    }

    pub(crate) async fn pending_hash(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .pending
            .as_ref()
            .map(|p| p.package_hash.clone())
    }

    pub(crate) async fn backgrounded(&self) {
        self.state.lock().await.backgrounded_at = Some(Instant::now());
    }

    pub(crate) async fn foregrounded(
        &self,
        bridge: &dyn NativeBridge,
    ) -> Result<ResumeOutcome, Error> {
        let mut state = self.state.lock().await;
        let background = state
            .backgrounded_at
            .take()
            .map_or(Duration::ZERO, |at| at.elapsed());
        let Some(pending) = state.pending.as_ref() else {
            return Ok(ResumeOutcome::NothingPending);
        };

        if background < pending.minimum_background {
            tracing::debug!(
                package_hash = %pending.package_hash,
                background_ms = background.as_millis(),
                "resume too soon, install stays pending"
            );
            return Ok(ResumeOutcome::Deferred {
                package_hash: pending.package_hash.clone(),
                background,
                minimum_background: pending.minimum_background,
            });
        }

        bridge.reload().await?;
        let package_hash = pending.package_hash.clone();
        state.pending = None;
        tracing::info!(package_hash = %package_hash, "pending install applied on resume");
        Ok(ResumeOutcome::Applied { package_hash })
    }
}
