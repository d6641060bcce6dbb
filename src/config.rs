//! Configuration types for batscope

use crate::error::{Error, Result};
use crate::types::{InputType, SpectrogramTheme};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};
use utoipa::ToSchema;

/// Classification backend connection settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BackendConfig {
    /// Base URL of the backend (default: "http://localhost:8000")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for one-shot requests in seconds (default: 30)
    #[serde(default = "default_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Optional overall timeout for a batch stream in seconds (None = unlimited)
    ///
    /// Batches of long recordings can stream for many minutes, so this is off by default.
    #[serde(default, with = "optional_duration_serde")]
    #[schema(value_type = Option<u64>)]
    pub stream_timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            stream_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Analysis parameters sent with every upload
///
/// Doubles as the dashboard-wide defaults in [`Config`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisParams {
    /// Kind of files being uploaded (default: audio)
    #[serde(default)]
    pub input_type: InputType,

    /// Spectrogram color theme (default: dark_viridis)
    #[serde(default)]
    pub theme: SpectrogramTheme,

    /// Minimum confidence for a species to be reported (default: 0.01)
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Maximum confidence threshold (default: 0.5)
    #[serde(default = "default_max_threshold")]
    pub max_threshold: f64,

    /// Upper frequency bound of the analysis in kHz (default: 250)
    #[serde(default = "default_max_freq")]
    pub max_freq: u32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            input_type: InputType::default(),
            theme: SpectrogramTheme::default(),
            threshold: default_threshold(),
            max_threshold: default_max_threshold(),
            max_freq: default_max_freq(),
        }
    }
}

impl AnalysisParams {
    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(config_error(
                "analysis.threshold",
                format!("threshold must be within 0..=1, got {}", self.threshold),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_threshold) {
            return Err(config_error(
                "analysis.max_threshold",
                format!(
                    "max_threshold must be within 0..=1, got {}",
                    self.max_threshold
                ),
            ));
        }
        if self.max_freq == 0 {
            return Err(config_error(
                "analysis.max_freq",
                "max_freq must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Background health monitoring
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MonitorConfig {
    /// Poll backend health in the background (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Seconds between health checks (default: 30)
    #[serde(default = "default_health_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub health_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            health_interval: default_health_interval(),
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// Local dashboard API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Local dashboard REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for the dashboard
///
/// - [`backend`](BackendConfig) - classification service endpoint
/// - [`analysis`](AnalysisParams) - default upload parameters
/// - [`monitor`](MonitorConfig) - background health polling
/// - [`server`](ServerIntegrationConfig) - local dashboard API
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Default analysis parameters
    #[serde(default)]
    pub analysis: AnalysisParams,

    /// Health monitor settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Local API server settings
    #[serde(default)]
    pub server: ServerIntegrationConfig,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            analysis: AnalysisParams::default(),
            monitor: MonitorConfig::default(),
            server: ServerIntegrationConfig::default(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    ///
    /// Missing fields take their defaults. The result is validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("invalid config file '{}': {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the backend URL does not parse as an
    /// http(s) URL, a timeout or the health interval is zero, the analysis
    /// defaults are out of range, or the event buffer is zero.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.backend.base_url).map_err(|e| {
            config_error(
                "backend.base_url",
                format!("invalid base URL '{}': {}", self.backend.base_url, e),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(config_error(
                "backend.base_url",
                format!("unsupported URL scheme '{}'", url.scheme()),
            ));
        }

        if self.backend.timeout.is_zero() {
            return Err(config_error(
                "backend.timeout",
                "timeout must be greater than zero",
            ));
        }
        if self.backend.stream_timeout.is_some_and(|t| t.is_zero()) {
            return Err(config_error(
                "backend.stream_timeout",
                "stream_timeout must be greater than zero when set",
            ));
        }
        // tokio::time::interval panics on a zero period
        if self.monitor.enabled && self.monitor.health_interval.is_zero() {
            return Err(config_error(
                "monitor.health_interval",
                "health_interval must be greater than zero",
            ));
        }

        self.analysis.validate()?;

        if self.event_buffer == 0 {
            return Err(config_error(
                "event_buffer",
                "event_buffer must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn config_error(key: &str, message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("batscope/{}", env!("CARGO_PKG_VERSION"))
}

fn default_threshold() -> f64 {
    0.01
}

fn default_max_threshold() -> f64 {
    0.5
}

fn default_max_freq() -> u32 {
    250
}

fn default_health_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_event_buffer() -> usize {
    1000
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
