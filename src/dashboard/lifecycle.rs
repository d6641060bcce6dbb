//! Shutdown coordination.

use crate::types::Event;
use std::time::Duration;

use super::Dashboard;

/// How long shutdown waits for a cancelled batch to release its slot
const BATCH_RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

impl Dashboard {
    /// Gracefully shut down the dashboard
    ///
    /// 1. Stops accepting new batches
    /// 2. Cancels the running batch and the health monitor
    /// 3. Waits (bounded) for the batch to release its slot
    /// 4. Emits [`Event::Shutdown`]
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        self.lifecycle
            .accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new batches");

        // Batch tokens are children of this one
        self.lifecycle.shutdown.cancel();

        match tokio::time::timeout(BATCH_RELEASE_TIMEOUT, self.wait_for_batch_release()).await {
            Ok(()) => tracing::info!("No batch running"),
            Err(_) => {
                tracing::warn!("Timeout waiting for the batch to stop, proceeding with shutdown")
            }
        }

        self.emit_event(Event::Shutdown);
        tracing::info!("Graceful shutdown complete");
    }

    /// Whether shutdown has started
    pub fn is_shutting_down(&self) -> bool {
        self.lifecycle.shutdown.is_cancelled()
    }

    async fn wait_for_batch_release(&self) {
        while self.is_batch_active() {
            tracing::debug!("Waiting for active batch to stop");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
