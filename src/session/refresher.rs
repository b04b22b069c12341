//! Fixed-delay polling refresher.
//!
//! While the session is authenticated, the refresher repeatedly fetches
//! the full item set and publishes it to the view through the controller's
//! guarded path. The delay runs from one fetch *completing* to the next
//! starting, not at a fixed rate.
//!
//! Stop semantics: cancellation wins the delay race, so a stopped
//! refresher never begins another iteration. An in-flight fetch is not
//! cancelled; its result is discarded by the controller's epoch/state
//! check before it can touch the view.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::SessionController;

/// Owned handle to a running refresher task.
///
/// The controller owns this outright and stops it on teardown; there is
/// no back-pointer from the task to the controller's lifecycle.
pub(crate) struct RefresherHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    pub(crate) fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { cancel, task }
    }

    /// Request the loop to stop. The task exits at its next suspension
    /// point without scheduling another iteration.
    pub(crate) fn stop(self) {
        self.cancel.cancel();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the polling loop for one login epoch.
pub(crate) fn spawn(
    controller: SessionController,
    epoch: u64,
    cancel: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(epoch, interval_ms = interval.as_millis() as u64, "refresher started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            controller.refresh_once(epoch).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        tracing::debug!(epoch, "refresher stopped");
    })
}
