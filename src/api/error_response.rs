//! HTTP error response handling for the API
//!
//! This module provides conversions from domain errors to HTTP responses
//! with appropriate status codes and JSON error bodies.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::warn!(status = status_code.as_u16(), error = %self, "API request failed");
        }

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

/// Implement IntoResponse for ApiError for explicit error responses
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Errors that know their status go through Error::into_response
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
