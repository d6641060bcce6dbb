//! Dashboard facade split into focused submodules.
//!
//! The `Dashboard` struct and its methods are organized by area:
//! - [`batch`] - Batch submission, cancellation, and progress snapshots
//! - [`refresh`] - Cached health, statistics, and history views
//! - [`analysis`] - Single-file analysis, deletion, and explanations
//! - [`assistant`] - Chat transcript
//! - [`monitor`] - Background health polling
//! - [`lifecycle`] - Shutdown coordination

mod analysis;
mod assistant;
mod batch;
mod lifecycle;
mod monitor;
mod refresh;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use refresh::DashboardView;

use crate::batch::BatchStore;
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::types::{ChatMessage, Event};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Active batch run bookkeeping
#[derive(Clone)]
pub(crate) struct BatchState {
    /// Results, counters, and log of the current (or last) run
    pub(crate) store: Arc<RwLock<BatchStore>>,
    /// Cancellation token of the running batch, if any (at most one)
    pub(crate) active: Arc<std::sync::Mutex<Option<CancellationToken>>>,
}

/// Shutdown coordination
#[derive(Clone)]
pub(crate) struct Lifecycle {
    /// Whether new batches are accepted (false once shutdown starts)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Cancelled on shutdown; batch tokens are children of it
    pub(crate) shutdown: CancellationToken,
}

/// Main dashboard instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Dashboard {
    /// Backend client
    pub(crate) client: ApiClient,
    /// Configuration
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Batch run state
    pub(crate) batch: BatchState,
    /// Cached health, statistics, and history
    pub(crate) view: Arc<RwLock<DashboardView>>,
    /// Chat transcript, oldest first
    pub(crate) transcript: Arc<RwLock<Vec<ChatMessage>>>,
    /// Shutdown coordination
    pub(crate) lifecycle: Lifecycle,
}

impl Dashboard {
    /// Create a dashboard for the configured backend
    ///
    /// Validates the configuration and builds the HTTP client. Nothing is
    /// fetched until a refresh is requested or the monitor is started.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let client = ApiClient::new(&config.backend)?;
        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_buffer);

        tracing::info!(backend = %client.base_url(), "dashboard created");

        Ok(Self {
            client,
            config: Arc::new(config),
            event_tx,
            batch: BatchState {
                store: Arc::new(RwLock::new(BatchStore::new())),
                active: Arc::new(std::sync::Mutex::new(None)),
            },
            view: Arc::new(RwLock::new(DashboardView::default())),
            transcript: Arc::new(RwLock::new(Vec::new())),
            lifecycle: Lifecycle {
                accepting_new: Arc::new(AtomicBool::new(true)),
                shutdown: CancellationToken::new(),
            },
        })
    }

    /// Subscribe to dashboard events
    ///
    /// Each subscriber gets every event emitted after it subscribed. A slow
    /// subscriber that falls more than `event_buffer` events behind sees
    /// `RecvError::Lagged` and skips ahead.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers
    pub(crate) fn emit_event(&self, event: Event) {
        // No subscribers is fine
        self.event_tx.send(event).ok();
    }

    /// The backend client, for exports and other direct calls
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Get a reference to the configuration
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Spawn the local dashboard API server in a background task
    ///
    /// The server listens on `server.api.bind_address` until the task is
    /// aborted or the process exits.
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let dashboard = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(dashboard, config).await })
    }
}
