//! Batch submission, cancellation, and progress snapshots.

use crate::batch::{BatchConsumer, BatchOutcome, BatchSnapshot, RefreshHandler};
use crate::client::UploadFile;
use crate::config::AnalysisParams;
use crate::error::{BatchError, Error, Result};
use crate::types::Event;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

use super::Dashboard;

/// Claim on the single batch slot; releasing it clears the slot
///
/// Dropping the guard also cancels its token, so a run whose task is
/// aborted stops reading the stream.
pub(crate) struct ActiveBatch {
    slot: Arc<std::sync::Mutex<Option<CancellationToken>>>,
    token: CancellationToken,
}

impl Drop for ActiveBatch {
    fn drop(&mut self) {
        self.token.cancel();
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl Dashboard {
    /// Submit files as one batch and fold its progress stream to the end
    ///
    /// The batch store is reset before the stream is opened. Progress is
    /// visible through [`Dashboard::batch_snapshot`] and [`Dashboard::subscribe`]
    /// while this runs.
    ///
    /// # Errors
    ///
    /// - [`BatchError::InProgress`] if another batch is running
    /// - [`BatchError::NoFiles`] if `uploads` is empty
    /// - [`BatchError::StreamUnavailable`] if the backend rejects the batch
    /// - [`BatchError::Interrupted`] if the stream breaks off (partial state is kept)
    /// - [`Error::ShuttingDown`] once shutdown has started
    pub async fn submit_batch(
        &self,
        uploads: Vec<UploadFile>,
        params: &AnalysisParams,
    ) -> Result<BatchOutcome> {
        let guard = self.claim_batch(&uploads, params)?;
        self.run_batch(guard, uploads, params).await
    }

    /// Like [`Dashboard::submit_batch`], but runs on a background task
    ///
    /// The batch slot is claimed before returning, so a conflicting
    /// submission is reported immediately rather than from the task.
    pub fn spawn_batch(
        &self,
        uploads: Vec<UploadFile>,
        params: AnalysisParams,
    ) -> Result<tokio::task::JoinHandle<Result<BatchOutcome>>> {
        let guard = self.claim_batch(&uploads, &params)?;
        let dashboard = self.clone();

        Ok(tokio::spawn(async move {
            dashboard.run_batch(guard, uploads, &params).await
        }))
    }

    /// Cancel the running batch, if any
    ///
    /// Returns whether a batch was running. Folded results stay in the store.
    pub fn cancel_batch(&self) -> bool {
        let slot = self.batch.active.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(token) => {
                tracing::info!("cancelling active batch");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a batch is currently running
    pub fn is_batch_active(&self) -> bool {
        self.batch
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Copy of the current batch store
    pub async fn batch_snapshot(&self) -> BatchSnapshot {
        self.batch.store.read().await.snapshot()
    }

    fn claim_batch(&self, uploads: &[UploadFile], params: &AnalysisParams) -> Result<ActiveBatch> {
        if !self.lifecycle.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        if uploads.is_empty() {
            return Err(BatchError::NoFiles.into());
        }
        params.validate()?;

        let mut slot = self.batch.active.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return Err(BatchError::InProgress.into());
        }

        let token = self.lifecycle.shutdown.child_token();
        *slot = Some(token.clone());

        Ok(ActiveBatch {
            slot: self.batch.active.clone(),
            token,
        })
    }

    async fn run_batch(
        &self,
        guard: ActiveBatch,
        uploads: Vec<UploadFile>,
        params: &AnalysisParams,
    ) -> Result<BatchOutcome> {
        let file_count = uploads.len();
        self.batch.store.write().await.begin();
        tracing::info!(files = file_count, "submitting batch");

        let opened = tokio::select! {
            biased;
            _ = guard.token.cancelled() => {
                let mut store = self.batch.store.write().await;
                store.mark_cancelled();
                self.emit_event(Event::BatchCancelled { batch_id: None });
                return Ok(BatchOutcome::Cancelled);
            }
            opened = self.client.open_batch_stream(uploads, params) => opened,
        };

        let response = match opened {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, files = file_count, "batch stream could not be opened");
                self.batch.store.write().await.mark_unavailable(e.to_string());
                self.emit_event(Event::BatchFailed {
                    batch_id: None,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let refresh: Arc<dyn RefreshHandler> = Arc::new(self.clone());
        let consumer = BatchConsumer::new(
            self.batch.store.clone(),
            self.event_tx.clone(),
            refresh,
            guard.token.clone(),
        );

        let outcome = consumer.consume(response.bytes_stream()).await;
        drop(guard);
        outcome
    }
}
