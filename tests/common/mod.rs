//! Common test utilities for batscope integration tests

use batscope::{Config, Dashboard};
use std::time::Duration;

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Load the live backend URL from the environment
///
/// Required environment variables:
/// - `BATSCOPE_BACKEND_URL` - Base URL of a running classification backend
///
/// Optional environment variables:
/// - `BATSCOPE_SAMPLE_WAV` - Path to a recording used by the batch tests
#[allow(dead_code)]
pub fn load_backend_url() -> Result<String, ConfigError> {
    dotenvy::dotenv().ok();

    std::env::var("BATSCOPE_BACKEND_URL")
        .map_err(|_| ConfigError("BATSCOPE_BACKEND_URL not set in environment".to_string()))
}

/// Whether a live backend is configured
#[allow(dead_code)]
pub fn has_live_backend() -> bool {
    load_backend_url().is_ok()
}

/// Optional sample recording for upload tests
#[allow(dead_code)]
pub fn sample_wav() -> Option<std::path::PathBuf> {
    dotenvy::dotenv().ok();
    std::env::var("BATSCOPE_SAMPLE_WAV").ok().map(Into::into)
}

/// Config for `base_url` with the monitor off and generous timeouts
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.backend.base_url = base_url.to_string();
    config.backend.timeout = Duration::from_secs(60);
    config.monitor.enabled = false;
    config
}

/// Dashboard pointed at the live backend
#[allow(dead_code)]
pub fn create_live_dashboard() -> Result<Dashboard, Box<dyn std::error::Error>> {
    let url = load_backend_url()?;
    Ok(Dashboard::new(test_config(&url))?)
}
