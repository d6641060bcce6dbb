//! Batch progress records as sent by the backend.

use crate::types::AnalysisResult;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One record of the batch progress feed, discriminated by its `type` field
///
/// ```json
/// {"type": "batch_start", "batch_id": "b-17", "total_files": 12}
/// {"type": "result", "data": {"file_id": "f-1", "original_filename": "a.wav"}}
/// {"type": "error", "filename": "b.wav", "error": "unsupported sample rate"}
/// {"type": "batch_complete", "completed": 11, "failed": 1}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Batch accepted; announces its ID and size
    BatchStart {
        /// Backend-issued batch ID
        batch_id: String,
        /// Number of files the backend will process
        total_files: u64,
    },

    /// One file analyzed; the payload is nested under `data`
    Result {
        /// The analysis result (absent or falsy on a protocol anomaly)
        #[serde(default, deserialize_with = "result_payload")]
        data: Option<AnalysisResult>,
    },

    /// One file failed analysis
    Error {
        /// Uploaded filename
        #[serde(default)]
        filename: String,
        /// Backend error message
        #[serde(default)]
        error: String,
    },

    /// Batch finished; counts as seen by the backend
    BatchComplete {
        /// Files processed
        #[serde(default)]
        completed: u64,
        /// Files failed
        #[serde(default)]
        failed: u64,
    },

    /// Any other `type` value
    #[serde(other)]
    Unknown,
}

fn result_payload<'de, D>(deserializer: D) -> Result<Option<AnalysisResult>, D::Error>
where
    D: Deserializer<'de>,
{
    let payload = Value::deserialize(deserializer)?;
    Ok(AnalysisResult::from_payload(&payload))
}

/// Parse one NDJSON line
///
/// Blank lines yield `Ok(None)`. A line that is not JSON, or has no `type`
/// field, is an error.
pub fn parse_line(line: &str) -> serde_json::Result<Option<StreamEvent>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}
