use futures::channel::{mpsc, oneshot};
use futures::{Stream, StreamExt};
use hotswap_errors::Error;
use hotswap_types::SyncStatus;
use std::pin::Pin;
use std::task::{Context, Poll};

pub(crate) type StatusSink = mpsc::UnboundedSender<SyncStatus>;
pub(crate) type OutcomeSink = oneshot::Sender<Result<SyncStatus, Error>>;

/// Status updates of one sync call, ending with its terminal status
#[derive(Debug)]
pub struct SyncStream {
    statuses: mpsc::UnboundedReceiver<SyncStatus>,
    outcome: oneshot::Receiver<Result<SyncStatus, Error>>,
}

impl SyncStream {
    pub(crate) fn channel() -> (StatusSink, OutcomeSink, Self) {
        let (status_tx, statuses) = mpsc::unbounded();
        let (outcome_tx, outcome) = oneshot::channel();
        (status_tx, outcome_tx, Self { statuses, outcome })
    }

    /// Wait for the terminal status.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing stage when the sync ended in `ERROR`.
    pub async fn finish(self) -> Result<SyncStatus, Error> {
        self.outcome
            .await
            .map_err(|_| Error::internal("sync task ended without reporting an outcome"))?
    }

    /// Drain every status, then wait for the outcome
    pub async fn drain(mut self) -> (Vec<SyncStatus>, Result<SyncStatus, Error>) {
        let mut seen = Vec::new();
        while let Some(status) = self.statuses.next().await {
            seen.push(status);
        }
        (seen, self.finish().await)
    }
}

impl Stream for SyncStream {
    type Item = SyncStatus;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.statuses.poll_next_unpin(cx)
    }
}
