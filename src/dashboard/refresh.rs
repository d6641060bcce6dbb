//! Cached health, statistics, and history views.

use crate::batch::RefreshHandler;
use crate::error::Result;
use crate::types::{AnalysisResult, Event, HealthStatus, Statistics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Dashboard;

/// Last known state of the backend, as shown on the dashboard pages
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DashboardView {
    /// Last successful health check
    pub health: Option<HealthStatus>,
    /// Last fetched aggregate statistics
    pub statistics: Option<Statistics>,
    /// Stored results from the last history fetch
    pub results: Vec<AnalysisResult>,
    /// Whether the last health check succeeded
    pub is_online: bool,
    /// When any view was last refreshed successfully
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl Dashboard {
    /// Snapshot of the cached views
    pub async fn view(&self) -> DashboardView {
        self.view.read().await.clone()
    }

    /// Re-fetch aggregate statistics
    pub async fn refresh_statistics(&self) -> Result<Statistics> {
        let statistics = self.client.statistics().await?;
        {
            let mut view = self.view.write().await;
            view.statistics = Some(statistics.clone());
            view.last_refreshed = Some(Utc::now());
        }

        tracing::debug!(total_analyses = statistics.total_analyses, "statistics refreshed");
        self.emit_event(Event::StatisticsRefreshed {
            total_analyses: statistics.total_analyses,
        });
        Ok(statistics)
    }

    /// Re-fetch stored results; returns how many there are
    pub async fn refresh_results(&self) -> Result<usize> {
        let results = self.client.results().await?;
        let count = results.len();
        {
            let mut view = self.view.write().await;
            view.results = results;
            view.last_refreshed = Some(Utc::now());
        }

        tracing::debug!(count, "results refreshed");
        self.emit_event(Event::ResultsRefreshed { count });
        Ok(count)
    }

    /// Check backend health; returns whether the backend is online
    ///
    /// A failed check marks the backend offline but keeps the last known
    /// service map. [`Event::HealthChanged`] is only emitted on transitions.
    pub async fn refresh_health(&self) -> bool {
        let checked = self.client.health().await;

        let mut view = self.view.write().await;
        let was_online = view.is_online;

        match checked {
            Ok(health) => {
                view.health = Some(health);
                view.is_online = true;
                view.last_refreshed = Some(Utc::now());
            }
            Err(e) => {
                tracing::warn!(error = %e, "backend health check failed");
                view.is_online = false;
            }
        }

        let online = view.is_online;
        drop(view);

        if online != was_online {
            tracing::info!(online, "backend reachability changed");
            self.emit_event(Event::HealthChanged { online });
        }
        online
    }

    /// Refresh health, statistics, and results concurrently
    ///
    /// Failures are logged; the returned view holds whatever succeeded.
    pub async fn refresh_all(&self) -> DashboardView {
        let (_, statistics, results) = tokio::join!(
            self.refresh_health(),
            self.refresh_statistics(),
            self.refresh_results()
        );

        if let Err(e) = statistics {
            tracing::warn!(error = %e, "failed to refresh statistics");
        }
        if let Err(e) = results {
            tracing::warn!(error = %e, "failed to refresh results");
        }

        self.view().await
    }
}

impl RefreshHandler for Dashboard {
    fn request_statistics_refresh(&self) {
        let dashboard = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dashboard.refresh_statistics().await {
                tracing::warn!(error = %e, "failed to refresh statistics");
            }
        });
    }

    fn request_results_refresh(&self) {
        let dashboard = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dashboard.refresh_results().await {
                tracing::warn!(error = %e, "failed to refresh results");
            }
        });
    }
}
