//! Application state for the API server

use crate::{Config, Dashboard};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The dashboard instance the handlers drive
    pub dashboard: Arc<Dashboard>,

    /// Configuration (analysis defaults for uploads without form fields)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(dashboard: Arc<Dashboard>, config: Arc<Config>) -> Self {
        Self { dashboard, config }
    }
}
