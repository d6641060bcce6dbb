//! Error types for batscope
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Batch, Config, Backend, etc.)
//! - HTTP status code mapping for the local dashboard API
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for batscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batscope
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "backend.base_url")
        key: Option<String>,
    },

    /// Transport-level failure talking to the classification backend
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend returned HTTP {status} for {endpoint}: {message}")]
    Backend {
        /// Endpoint path that was called (e.g., "/api/stats")
        endpoint: String,
        /// HTTP status code returned by the backend
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// Backend answered successfully but the body had an unexpected shape
    #[error("invalid backend response from {endpoint}: {reason}")]
    InvalidResponse {
        /// Endpoint path that was called
        endpoint: String,
        /// What was wrong with the body
        reason: String,
    },

    /// Batch analysis error
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// I/O error (reading upload files, binding the API listener)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request input (empty upload list, bad field value)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Shutdown in progress - not accepting new batches
    #[error("shutdown in progress: not accepting new batches")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors raised by the batch stream lifecycle
#[derive(Debug, Error)]
pub enum BatchError {
    /// A batch stream is already open on this dashboard
    #[error("a batch is already in progress")]
    InProgress,

    /// Batch submitted with no files
    #[error("batch contains no files")]
    NoFiles,

    /// The stream could not be opened (rejected request or missing body)
    #[error("batch stream unavailable: {reason}")]
    StreamUnavailable {
        /// Why the stream could not be opened
        reason: String,
    },

    /// The stream opened but broke off before the backend finished it
    #[error("batch stream interrupted after {processed} processed files: {reason}")]
    Interrupted {
        /// Batch ID announced by the backend, if `batch_start` was seen
        batch_id: Option<String>,
        /// Files processed (success or failure) before the interruption
        processed: u64,
        /// Transport error message
        reason: String,
    },
}

/// API error response format
///
/// This structure is returned by the local dashboard API when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "batch_in_progress",
///     "message": "batch error: a batch is already in progress"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::InvalidInput(_) => 400,
            Error::Batch(BatchError::NoFiles) => 400,

            Error::NotFound(_) => 404,

            Error::Batch(BatchError::InProgress) => 409,

            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // Upstream failures
            Error::Network(_) => 502,
            Error::Backend { .. } => 502,
            Error::InvalidResponse { .. } => 502,
            Error::Batch(BatchError::StreamUnavailable { .. }) => 502,
            Error::Batch(BatchError::Interrupted { .. }) => 502,

            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Backend { .. } => "backend_error",
            Error::InvalidResponse { .. } => "invalid_response",
            Error::Batch(e) => match e {
                BatchError::InProgress => "batch_in_progress",
                BatchError::NoFiles => "no_files",
                BatchError::StreamUnavailable { .. } => "stream_unavailable",
                BatchError::Interrupted { .. } => "stream_interrupted",
            },
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotFound(_) => "not_found",
            Error::InvalidInput(_) => "validation_error",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Backend {
                endpoint, status, ..
            } => Some(serde_json::json!({
                "endpoint": endpoint,
                "upstream_status": status,
            })),
            Error::Batch(BatchError::Interrupted {
                batch_id,
                processed,
                ..
            }) => Some(serde_json::json!({
                "batch_id": batch_id,
                "processed": processed,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
