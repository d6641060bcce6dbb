//! Background health polling.

use super::Dashboard;

impl Dashboard {
    /// Start polling backend health every `monitor.health_interval`
    ///
    /// The first check runs immediately. The task ends on shutdown. When the
    /// monitor is disabled in config, the returned task completes at once.
    pub fn start_health_monitor(&self) -> tokio::task::JoinHandle<()> {
        if !self.config.monitor.enabled {
            tracing::info!("Health monitor disabled, skipping");
            return tokio::spawn(async {});
        }

        let dashboard = self.clone();
        let period = self.config.monitor.health_interval;
        let shutdown = self.lifecycle.shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Health monitor stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        dashboard.refresh_health().await;
                    }
                }
            }
        });

        tracing::info!(interval_secs = period.as_secs(), "Health monitor started");
        handle
    }
}
