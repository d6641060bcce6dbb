//! Core types for batscope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::ToSchema;

/// Forgiving field decoders for backend records
///
/// The backend is loosely typed: numbers arrive as ints or floats, and any
/// field may be `null`. A record must never be rejected for that.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// `null` becomes `T::default()`
    pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Any JSON number or numeric string; anything else is 0
    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number_of(&Value::deserialize(deserializer)?))
    }

    /// Like [`number`], rounded and saturated into `u32`
    pub fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(deserializer)?.round() as u32)
    }

    /// Strings as-is, numbers and booleans as text, `null` as empty
    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(text_of(&Value::deserialize(deserializer)?))
    }

    fn number_of(value: &Value) -> f64 {
        match value {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        }
    }

    pub(crate) fn text_of(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// One (species, confidence) pair reported by the classifier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpeciesDetected {
    /// Species name (e.g., "Pipistrellus pipistrellus")
    #[serde(default, deserialize_with = "lenient::text")]
    pub species: String,
    /// Confidence, either a 0..1 fraction or a 0..100 percentage depending on backend version
    #[serde(default, deserialize_with = "lenient::number")]
    pub confidence: f64,
}

/// Acoustic measurements describing one detected call
///
/// Frequencies are in kHz, durations in milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CallParameters {
    /// Frequency at call onset
    #[serde(deserialize_with = "lenient::number")]
    pub start_frequency: f64,
    /// Frequency at call end
    #[serde(deserialize_with = "lenient::number")]
    pub end_frequency: f64,
    /// Frequency of maximum energy
    #[serde(deserialize_with = "lenient::number")]
    pub peak_frequency: f64,
    /// Start/end frequency span
    #[serde(deserialize_with = "lenient::number")]
    pub bandwidth: f64,
    /// Relative call intensity
    #[serde(deserialize_with = "lenient::number")]
    pub intensity: f64,
    /// Duration of a single pulse
    #[serde(deserialize_with = "lenient::number")]
    pub pulse_duration: f64,
    /// Total length of the call sequence
    #[serde(deserialize_with = "lenient::number")]
    pub total_length: f64,
    /// Call shape classification (e.g., "FM", "CF", "QCF")
    #[serde(deserialize_with = "lenient::text")]
    pub shape: String,
}

/// Classification result for a single uploaded file
///
/// Treated as an atomic value: received from the backend, never mutated.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResult {
    /// Backend-issued file identifier
    #[serde(default, deserialize_with = "lenient::text")]
    pub file_id: String,
    /// Filename as uploaded
    #[serde(default, deserialize_with = "lenient::text")]
    pub original_filename: String,
    /// Unix timestamp of the analysis
    #[serde(default, deserialize_with = "lenient::number")]
    pub timestamp: f64,
    /// Recording duration in seconds
    #[serde(default, deserialize_with = "lenient::number")]
    pub duration: f64,
    /// Recording sample rate in Hz
    #[serde(default, deserialize_with = "lenient::whole_number")]
    pub sample_rate: u32,
    /// Backend-relative URL of the rendered spectrogram
    #[serde(default, deserialize_with = "lenient::text")]
    pub spectrogram_url: String,
    /// Reference image of the top species
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species_image_url: Option<String>,
    /// Backend-relative URL of the (possibly converted) audio
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Ranked species detections, best first
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub species_detected: Vec<SpeciesDetected>,
    /// Acoustic call parameters
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub call_parameters: CallParameters,
    /// Minimum confidence used for this analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Maximum confidence threshold used for this analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_threshold: Option<f64>,
}

impl AnalysisResult {
    /// Decode a backend payload, keeping whatever it can
    ///
    /// Falsy payloads (`null`, `false`, `0`, `""`) yield `None`. Any other
    /// payload yields a result; one that does not decode keeps only its
    /// identifiers.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let falsy = match payload {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(_) | Value::Object(_) => false,
        };
        if falsy {
            return None;
        }

        match Self::deserialize(payload) {
            Ok(result) => Some(result),
            Err(e) => {
                let field = |key: &str| payload.get(key).map(lenient::text_of).unwrap_or_default();
                let result = Self {
                    file_id: field("file_id"),
                    original_filename: field("original_filename"),
                    ..Self::default()
                };
                tracing::warn!(
                    file_id = %result.file_id,
                    error = %e,
                    "result payload only partly decodable, keeping identifiers"
                );
                Some(result)
            }
        }
    }

    /// The highest-ranked detection, if any
    pub fn top_species(&self) -> Option<&SpeciesDetected> {
        self.species_detected.first()
    }
}

/// Backend service health, keyed by service name
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthStatus {
    /// Service name to status string (e.g., "model" => "healthy")
    #[serde(default)]
    pub services: HashMap<String, String>,
}

/// One entry of the most-detected species ranking
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpeciesCount {
    /// Species name
    pub species: String,
    /// Number of analyses where it was the top detection
    pub count: u64,
}

/// Aggregate statistics computed by the backend
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Statistics {
    /// Number of analyses stored
    pub total_analyses: u64,
    /// Total analyzed audio in hours
    pub total_duration_hours: f64,
    /// Number of distinct species seen
    pub unique_species_detected: u64,
    /// Storage backend in use (e.g., "local", "s3")
    pub storage_type: String,
    /// Most frequently detected species, descending
    pub top_species: Vec<SpeciesCount>,
}

/// Metadata for a batch previously run on the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BatchMetadata {
    /// Backend-issued batch identifier
    pub batch_id: String,
    /// Files submitted
    #[serde(default)]
    pub total_files: u64,
    /// Files processed
    #[serde(default)]
    pub completed: u64,
    /// Files that failed
    #[serde(default)]
    pub failed: u64,
    /// File IDs of the stored results
    #[serde(default)]
    pub file_ids: Vec<String>,
    /// Unix timestamp of submission
    #[serde(default)]
    pub created_at: f64,
    /// Spectrogram theme used
    #[serde(default)]
    pub theme: String,
    /// Input type used ("audio" or "spectrogram")
    #[serde(default)]
    pub input_type: String,
}

/// Kind of file submitted for analysis
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Raw audio recording (.wav)
    #[default]
    Audio,
    /// Pre-rendered spectrogram image (.png, .jpg)
    Spectrogram,
}

impl InputType {
    /// Wire value sent in the `input_type` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Audio => "audio",
            InputType::Spectrogram => "spectrogram",
        }
    }
}

/// Color map used when the backend renders spectrograms
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpectrogramTheme {
    /// Dark background, viridis palette
    #[default]
    DarkViridis,
    /// Light background, inferno palette
    LightInferno,
    /// Plasma palette
    Plasma,
    /// Magma palette
    Magma,
}

impl SpectrogramTheme {
    /// Wire value sent in the `theme` form field
    pub fn as_str(&self) -> &'static str {
        match self {
            SpectrogramTheme::DarkViridis => "dark_viridis",
            SpectrogramTheme::LightInferno => "light_inferno",
            SpectrogramTheme::Plasma => "plasma",
            SpectrogramTheme::Magma => "magma",
        }
    }
}

impl std::str::FromStr for SpectrogramTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark_viridis" => Ok(SpectrogramTheme::DarkViridis),
            "light_inferno" => Ok(SpectrogramTheme::LightInferno),
            "plasma" => Ok(SpectrogramTheme::Plasma),
            "magma" => Ok(SpectrogramTheme::Magma),
            other => Err(format!("unknown spectrogram theme: {other}")),
        }
    }
}

impl std::str::FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(InputType::Audio),
            "spectrogram" => Ok(InputType::Spectrogram),
            other => Err(format!("unknown input type: {other}")),
        }
    }
}

/// Export format for downloadable reports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// PDF report
    Pdf,
    /// Excel workbook
    Excel,
}

/// A downloaded export: suggested filename plus raw bytes
#[derive(Clone, Debug)]
pub struct Download {
    /// Filename to save as
    pub filename: String,
    /// Content type reported by the backend, if any
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Speaker of a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The person asking
    User,
    /// The backend assistant
    Assistant,
}

/// One message in a chat transcript
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// Who said it
    pub role: ChatRole,
    /// Message text
    pub content: String,
}

/// Progress counters for the active batch
///
/// `completed` counts processed files (success or failure), `failed` only
/// failures. `total` is announced once by `batch_start`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchProgress {
    /// Files processed so far
    pub completed: u64,
    /// Files announced by the backend
    pub total: u64,
    /// Files that failed analysis
    pub failed: u64,
}

impl BatchProgress {
    /// Processed fraction as a percentage (0.0 when the total is unknown)
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed as f32 / self.total as f32 * 100.0).min(100.0)
    }

    /// Files processed successfully
    pub fn succeeded(&self) -> u64 {
        self.completed.saturating_sub(self.failed)
    }
}

/// Timestamped, human-readable batch log entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogLine {
    /// When the line was recorded
    pub timestamp: DateTime<Utc>,
    /// Log text
    pub message: String,
}

impl LogLine {
    /// Create a log line stamped with the current time
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.timestamp.format("%H:%M:%S"), self.message)
    }
}

/// Lifecycle phase of the batch store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchPhase {
    /// No batch submitted yet
    #[default]
    Idle,
    /// Stream is open and being folded
    Running,
    /// Stream ended normally
    Completed,
    /// Stream failed to open or broke off
    Failed {
        /// Error message shown to the user
        error: String,
    },
    /// Run was cancelled before the stream ended
    Cancelled,
}

/// Event emitted by the dashboard
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Backend announced a new batch
    BatchStarted {
        /// Backend-issued batch ID
        batch_id: String,
        /// Number of files in the batch
        total_files: u64,
    },

    /// One file of the active batch was analyzed
    ResultReceived {
        /// Backend file ID
        file_id: String,
        /// Uploaded filename
        filename: String,
        /// Best species detection, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        top_species: Option<String>,
        /// Counters after folding this result
        progress: BatchProgress,
    },

    /// One file of the active batch failed analysis
    FileFailed {
        /// Uploaded filename
        filename: String,
        /// Backend error message
        error: String,
        /// Counters after folding this failure
        progress: BatchProgress,
    },

    /// Backend reported the batch finished
    BatchCompleted {
        /// Batch ID, if `batch_start` was seen
        #[serde(skip_serializing_if = "Option::is_none")]
        batch_id: Option<String>,
        /// Completed count reported by the backend
        completed: u64,
        /// Failed count reported by the backend
        failed: u64,
    },

    /// Batch stream could not be opened or broke off
    BatchFailed {
        /// Batch ID, if `batch_start` was seen
        #[serde(skip_serializing_if = "Option::is_none")]
        batch_id: Option<String>,
        /// Error message
        error: String,
    },

    /// Batch run cancelled locally
    BatchCancelled {
        /// Batch ID, if `batch_start` was seen
        #[serde(skip_serializing_if = "Option::is_none")]
        batch_id: Option<String>,
    },

    /// A single-file analysis finished
    AnalysisComplete {
        /// Backend file ID
        file_id: String,
        /// Uploaded filename
        filename: String,
    },

    /// A stored result was deleted
    ResultDeleted {
        /// Backend file ID
        file_id: String,
    },

    /// Aggregate statistics view refreshed
    StatisticsRefreshed {
        /// Total analyses reported by the backend
        total_analyses: u64,
    },

    /// Historical results view refreshed
    ResultsRefreshed {
        /// Number of stored results
        count: usize,
    },

    /// Backend reachability changed
    HealthChanged {
        /// Whether the backend answered the last health check
        online: bool,
    },

    /// Dashboard is shutting down
    Shutdown,
}

impl Event {
    /// Event name used as the SSE `event:` field
    pub fn kind(&self) -> &'static str {
        match self {
            Event::BatchStarted { .. } => "batch_started",
            Event::ResultReceived { .. } => "result_received",
            Event::FileFailed { .. } => "file_failed",
            Event::BatchCompleted { .. } => "batch_completed",
            Event::BatchFailed { .. } => "batch_failed",
            Event::BatchCancelled { .. } => "batch_cancelled",
            Event::AnalysisComplete { .. } => "analysis_complete",
            Event::ResultDeleted { .. } => "result_deleted",
            Event::StatisticsRefreshed { .. } => "statistics_refreshed",
            Event::ResultsRefreshed { .. } => "results_refreshed",
            Event::HealthChanged { .. } => "health_changed",
            Event::Shutdown => "shutdown",
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_analysis_result_fills_defaults() {
        let json = r#"{"file_id": "abc", "original_filename": "night1.wav"}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.file_id, "abc");
        assert_eq!(result.original_filename, "night1.wav");
        assert!(result.species_detected.is_empty());
        assert_eq!(result.call_parameters, CallParameters::default());
        assert!(result.top_species().is_none());
    }

    #[test]
    fn test_analysis_result_tolerates_loose_field_types() {
        let json = r#"{
            "original_filename": "night1.wav",
            "sample_rate": "192000",
            "duration": null,
            "species_detected": [{"species": null, "confidence": "0.42"}]
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.file_id, "");
        assert_eq!(result.sample_rate, 192000);
        assert_eq!(result.duration, 0.0);
        assert_eq!(result.species_detected[0].species, "");
        assert_eq!(result.species_detected[0].confidence, 0.42);
    }

    #[test]
    fn test_from_payload_skips_only_falsy_values() {
        assert!(AnalysisResult::from_payload(&serde_json::json!(null)).is_none());
        assert!(AnalysisResult::from_payload(&serde_json::json!(false)).is_none());

        let salvaged = AnalysisResult::from_payload(&serde_json::json!({
            "file_id": 42,
            "call_parameters": "FM"
        }))
        .unwrap();
        assert_eq!(salvaged.file_id, "42");
        assert_eq!(salvaged.call_parameters, CallParameters::default());
    }

    #[test]
    fn test_progress_percent_and_succeeded() {
        let progress = BatchProgress {
            completed: 3,
            total: 4,
            failed: 1,
        };
        assert_eq!(progress.percent(), 75.0);
        assert_eq!(progress.succeeded(), 2);

        assert_eq!(BatchProgress::default().percent(), 0.0);
    }

    #[test]
    fn test_progress_percent_caps_at_hundred() {
        // Backend can report more results than announced
        let progress = BatchProgress {
            completed: 6,
            total: 5,
            failed: 0,
        };
        assert_eq!(progress.percent(), 100.0);
    }

    #[test]
    fn test_event_serializes_with_snake_case_tag() {
        let event = Event::BatchStarted {
            batch_id: "b-42".to_string(),
            total_files: 5,
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "batch_started");
        assert_eq!(json["batch_id"], "b-42");
        assert_eq!(event.kind(), "batch_started");
    }

    #[test]
    fn test_batch_phase_failed_serialization() {
        let phase = BatchPhase::Failed {
            error: "connection reset".to_string(),
        };
        let json = serde_json::to_value(&phase).unwrap();

        assert_eq!(json["state"], "failed");
        assert_eq!(json["error"], "connection reset");
    }

    #[test]
    fn test_theme_wire_values_round_trip() {
        for theme in [
            SpectrogramTheme::DarkViridis,
            SpectrogramTheme::LightInferno,
            SpectrogramTheme::Plasma,
            SpectrogramTheme::Magma,
        ] {
            assert_eq!(theme.as_str().parse::<SpectrogramTheme>().unwrap(), theme);
        }
        assert!("sepia".parse::<SpectrogramTheme>().is_err());
    }

    #[test]
    fn test_log_line_display_has_clock_prefix() {
        let line = LogLine {
            timestamp: DateTime::parse_from_rfc3339("2024-05-01T21:04:09Z")
                .unwrap()
                .with_timezone(&Utc),
            message: "Batch started".to_string(),
        };
        assert_eq!(line.to_string(), "[21:04:09] Batch started");
    }
}
