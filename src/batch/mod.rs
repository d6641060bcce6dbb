//! Batch run state and the consumer that folds the progress stream into it.

mod consumer;
mod store;

pub use consumer::{BatchConsumer, BatchOutcome, RefreshHandler};
pub use store::{BatchSnapshot, BatchStore, FoldOutcome};
