//! Folds a batch response body into the shared [`BatchStore`].

use super::store::{BatchStore, FoldOutcome};
use crate::error::{BatchError, Result};
use crate::stream::NdjsonReader;
use crate::types::Event;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tokio_util::sync::CancellationToken;

/// Receives the refresh requests raised by `batch_complete`
///
/// Implementations must not block: the fold continues as soon as the calls
/// return.
pub trait RefreshHandler: Send + Sync {
    /// The aggregate statistics view is stale
    fn request_statistics_refresh(&self);

    /// The historical results view is stale
    fn request_results_refresh(&self);
}

/// How a batch stream ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The backend sent `batch_complete` and closed the stream
    Completed {
        /// Completed count reported by the backend
        completed: u64,
        /// Failed count reported by the backend
        failed: u64,
    },
    /// The stream closed cleanly without a `batch_complete` record
    EndedWithoutSummary,
    /// The run was cancelled before the stream ended
    Cancelled,
}

/// Drives one batch stream to its end
pub struct BatchConsumer {
    store: Arc<RwLock<BatchStore>>,
    event_tx: broadcast::Sender<Event>,
    refresh: Arc<dyn RefreshHandler>,
    cancel: CancellationToken,
}

impl BatchConsumer {
    /// Create a consumer folding into `store`
    pub fn new(
        store: Arc<RwLock<BatchStore>>,
        event_tx: broadcast::Sender<Event>,
        refresh: Arc<dyn RefreshHandler>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            event_tx,
            refresh,
            cancel,
        }
    }

    /// Read `body` to its end, folding every record as it arrives
    ///
    /// The store is expected to be freshly begun. Each folded record is
    /// visible in the store before the next chunk is read. A transport error
    /// mid-stream keeps the folded state, marks the store failed, and returns
    /// [`BatchError::Interrupted`].
    pub async fn consume<S, B, E>(&self, body: S) -> Result<BatchOutcome>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let mut body = std::pin::pin!(body);
        let mut reader = NdjsonReader::new();
        let mut summary = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Ok(self.finish_cancelled().await);
                }
                next = body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    for event in reader.feed(chunk.as_ref()) {
                        let outcome = self.store.write().await.apply(event);
                        match outcome {
                            FoldOutcome::Ignored => {}
                            FoldOutcome::Updated(event) => self.emit(event),
                            FoldOutcome::Finished(event) => {
                                if let Event::BatchCompleted {
                                    completed, failed, ..
                                } = &event
                                {
                                    summary = Some((*completed, *failed));
                                }
                                self.emit(event);
                                self.refresh.request_statistics_refresh();
                                self.refresh.request_results_refresh();
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    let stats = reader.finish();
                    return Err(self.finish_interrupted(e.to_string(), stats.parsed).await);
                }
                None => break,
            }
        }

        let stats = reader.finish();
        let mut store = self.store.write().await;
        store.mark_completed();

        match summary {
            Some((completed, failed)) => {
                tracing::info!(
                    batch_id = ?store.batch_id(),
                    completed,
                    failed,
                    records = stats.parsed,
                    malformed = stats.malformed,
                    "batch stream finished"
                );
                Ok(BatchOutcome::Completed { completed, failed })
            }
            None => {
                let progress = store.progress();
                tracing::warn!(
                    batch_id = ?store.batch_id(),
                    completed = progress.completed,
                    records = stats.parsed,
                    "batch stream ended without batch_complete"
                );
                self.emit(Event::BatchCompleted {
                    batch_id: store.batch_id().map(str::to_string),
                    completed: progress.completed,
                    failed: progress.failed,
                });
                Ok(BatchOutcome::EndedWithoutSummary)
            }
        }
    }

    async fn finish_cancelled(&self) -> BatchOutcome {
        let mut store = self.store.write().await;
        store.mark_cancelled();
        tracing::info!(batch_id = ?store.batch_id(), "batch run cancelled");
        self.emit(Event::BatchCancelled {
            batch_id: store.batch_id().map(str::to_string),
        });
        BatchOutcome::Cancelled
    }

    async fn finish_interrupted(&self, reason: String, records: u64) -> crate::Error {
        let mut store = self.store.write().await;
        let batch_id = store.batch_id().map(str::to_string);
        let processed = store.progress().completed;

        tracing::error!(
            batch_id = ?batch_id,
            processed,
            records,
            error = %reason,
            "batch stream interrupted"
        );
        store.mark_failed(format!("stream interrupted: {reason}"));
        self.emit(Event::BatchFailed {
            batch_id: batch_id.clone(),
            error: reason.clone(),
        });

        BatchError::Interrupted {
            batch_id,
            processed,
            reason,
        }
        .into()
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }
}
