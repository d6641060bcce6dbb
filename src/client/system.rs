//! Backend health and aggregate statistics.

use super::ApiClient;
use crate::error::Result;
use crate::types::{HealthStatus, Statistics};

impl ApiClient {
    /// Detailed per-service health of the backend
    pub async fn health(&self) -> Result<HealthStatus> {
        self.get_json("/api/health/detailed").await
    }

    /// Aggregate statistics over every stored analysis
    pub async fn statistics(&self) -> Result<Statistics> {
        self.get_json("/api/stats").await
    }
}
