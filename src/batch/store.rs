//! View state of the active batch run.

use crate::stream::StreamEvent;
use crate::types::{AnalysisResult, BatchPhase, BatchProgress, Event, LogLine};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use utoipa::ToSchema;

/// What folding one event did to the store
#[derive(Clone, Debug)]
pub enum FoldOutcome {
    /// Event carried nothing to fold (unknown type, missing payload)
    Ignored,
    /// State changed; the event describes the change
    Updated(Event),
    /// `batch_complete` was folded; the stats and history views are stale
    Finished(Event),
}

/// Results, counters, and log lines of the current batch
///
/// Everything here belongs to a single run: [`BatchStore::begin`] wipes it
/// before the next stream is opened. Results are kept newest first.
#[derive(Debug, Default)]
pub struct BatchStore {
    batch_id: Option<String>,
    results: VecDeque<AnalysisResult>,
    progress: BatchProgress,
    logs: Vec<LogLine>,
    phase: BatchPhase,
}

impl BatchStore {
    /// Create an idle, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all state and enter the running phase
    pub fn begin(&mut self) {
        *self = Self {
            phase: BatchPhase::Running,
            ..Self::default()
        };
    }

    /// Clear all state and return to idle
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Fold one stream event into the store
    pub fn apply(&mut self, event: StreamEvent) -> FoldOutcome {
        match event {
            StreamEvent::BatchStart {
                batch_id,
                total_files,
            } => self.apply_batch_start(batch_id, total_files),

            StreamEvent::Result { data: Some(result) } => self.apply_result(result),

            StreamEvent::Result { data: None } => {
                tracing::debug!(
                    batch_id = ?self.batch_id,
                    "result record without data payload, skipping"
                );
                FoldOutcome::Ignored
            }

            StreamEvent::Error { filename, error } => self.apply_file_error(filename, error),

            StreamEvent::BatchComplete { completed, failed } => {
                self.push_log(format!(
                    "Batch complete: {completed} analyzed, {failed} failed"
                ));
                FoldOutcome::Finished(Event::BatchCompleted {
                    batch_id: self.batch_id.clone(),
                    completed,
                    failed,
                })
            }

            StreamEvent::Unknown => FoldOutcome::Ignored,
        }
    }

    fn apply_batch_start(&mut self, batch_id: String, total_files: u64) -> FoldOutcome {
        match &self.batch_id {
            Some(current) => {
                tracing::warn!(
                    batch_id = %current,
                    repeated_id = %batch_id,
                    total_files,
                    "repeated batch_start, keeping the original batch id"
                );
            }
            None => self.batch_id = Some(batch_id.clone()),
        }

        // total never decreases
        self.progress.total = self.progress.total.max(total_files);
        self.push_log(format!("Batch {batch_id} started: {total_files} files"));

        FoldOutcome::Updated(Event::BatchStarted {
            batch_id: self.batch_id.clone().unwrap_or(batch_id),
            total_files: self.progress.total,
        })
    }

    fn apply_result(&mut self, result: AnalysisResult) -> FoldOutcome {
        let top_species = result.top_species().map(|s| s.species.clone());
        self.push_log(format!(
            "Analyzed {} ({})",
            result.original_filename,
            top_species.as_deref().unwrap_or("no species detected")
        ));
        self.progress.completed += 1;

        let event = Event::ResultReceived {
            file_id: result.file_id.clone(),
            filename: result.original_filename.clone(),
            top_species,
            progress: self.progress,
        };
        self.results.push_front(result);
        FoldOutcome::Updated(event)
    }

    fn apply_file_error(&mut self, filename: String, error: String) -> FoldOutcome {
        self.progress.completed += 1;
        self.progress.failed += 1;
        self.push_log(format!("Failed {filename}: {error}"));

        FoldOutcome::Updated(Event::FileFailed {
            filename,
            error,
            progress: self.progress,
        })
    }

    /// The stream ended normally
    pub fn mark_completed(&mut self) {
        self.phase = BatchPhase::Completed;
    }

    /// The stream could not be opened or broke off; folded state is kept
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.push_log(format!("Batch failed: {error}"));
        self.phase = BatchPhase::Failed { error };
    }

    /// The stream never opened; only the phase changes
    pub fn mark_unavailable(&mut self, error: impl Into<String>) {
        self.phase = BatchPhase::Failed {
            error: error.into(),
        };
    }

    /// The run was cancelled locally
    pub fn mark_cancelled(&mut self) {
        self.push_log("Batch cancelled");
        self.phase = BatchPhase::Cancelled;
    }

    fn push_log(&mut self, message: impl Into<String>) {
        self.logs.push(LogLine::now(message));
    }

    /// Batch ID announced by `batch_start`
    pub fn batch_id(&self) -> Option<&str> {
        self.batch_id.as_deref()
    }

    /// Accumulated results, newest first
    pub fn results(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.results.iter()
    }

    /// Current counters
    pub fn progress(&self) -> BatchProgress {
        self.progress
    }

    /// Log lines in the order they were written
    pub fn logs(&self) -> &[LogLine] {
        &self.logs
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> &BatchPhase {
        &self.phase
    }

    /// Whether a stream is being folded
    pub fn is_running(&self) -> bool {
        self.phase == BatchPhase::Running
    }

    /// Owned copy for rendering or serialization
    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            batch_id: self.batch_id.clone(),
            phase: self.phase.clone(),
            progress: self.progress,
            percent: self.progress.percent(),
            results: self.results.iter().cloned().collect(),
            logs: self.logs.clone(),
        }
    }
}

/// Point-in-time copy of a [`BatchStore`]
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchSnapshot {
    /// Batch ID, once announced
    pub batch_id: Option<String>,
    /// Lifecycle phase
    pub phase: BatchPhase,
    /// Counters
    pub progress: BatchProgress,
    /// Processed percentage (0-100)
    pub percent: f32,
    /// Results, newest first
    pub results: Vec<AnalysisResult>,
    /// Log lines, oldest first
    pub logs: Vec<LogLine>,
}
