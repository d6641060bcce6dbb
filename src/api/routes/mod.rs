//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`batch`] - Batch submission, progress, and cancellation
//! - [`results`] - Stored results
//! - [`analytics`] - Species lists and profiles
//! - [`system`] - Health, cached views, chat, events, OpenAPI

use serde::{Deserialize, Serialize};

mod analytics;
mod batch;
mod results;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use analytics::*;
pub use batch::*;
pub use results::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /results
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultsQuery {
    /// Only results with a detection of this species ("all" or absent: every result)
    pub species: Option<String>,
}

/// Response for POST /batch
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct BatchAccepted {
    /// Always "accepted"
    pub status: String,
    /// Number of files submitted
    pub files: usize,
}

/// Response for DELETE /batch
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct BatchCancelResponse {
    /// Whether a running batch was cancelled
    pub cancelled: bool,
}

/// Request body for POST /chat
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ChatRequest {
    /// The user's question
    pub message: String,
}
