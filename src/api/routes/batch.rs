//! Batch handlers: submit, progress snapshot, cancel.

use super::{BatchAccepted, BatchCancelResponse};
use crate::api::AppState;
use crate::batch::BatchSnapshot;
use crate::client::UploadFile;
use crate::config::AnalysisParams;
use crate::error::{Error, Result};
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};

/// GET /batch - Snapshot of the current (or last) batch
#[utoipa::path(
    get,
    path = "/api/v1/batch",
    tag = "batch",
    responses(
        (status = 200, description = "Batch progress, results, and log", body = BatchSnapshot)
    )
)]
pub async fn get_batch(State(state): State<AppState>) -> Json<BatchSnapshot> {
    Json(state.dashboard.batch_snapshot().await)
}

/// POST /batch - Submit files as one batch
///
/// Multipart body: one `files` part per file, plus optional `input_type`,
/// `theme`, `threshold`, `max_threshold`, and `max_freq` fields. Missing
/// fields take the configured analysis defaults. The batch runs in the
/// background; poll `GET /batch` or listen on `GET /events`.
#[utoipa::path(
    post,
    path = "/api/v1/batch",
    tag = "batch",
    request_body(content = String, content_type = "multipart/form-data", description = "`files` parts plus analysis fields"),
    responses(
        (status = 202, description = "Batch started", body = BatchAccepted),
        (status = 400, description = "No files or invalid parameters", body = crate::error::ApiError),
        (status = 409, description = "A batch is already running", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let (uploads, params) = read_batch_form(multipart, &state.config.analysis).await?;
    let files = uploads.len();

    // Detached; the task records its outcome in the store and the event bus
    let _task = state.dashboard.spawn_batch(uploads, params)?;
    tracing::info!(files, "batch accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(BatchAccepted {
            status: "accepted".to_string(),
            files,
        }),
    ))
}

/// DELETE /batch - Cancel the running batch
#[utoipa::path(
    delete,
    path = "/api/v1/batch",
    tag = "batch",
    responses(
        (status = 200, description = "Whether a batch was cancelled", body = BatchCancelResponse)
    )
)]
pub async fn cancel_batch(State(state): State<AppState>) -> Json<BatchCancelResponse> {
    Json(BatchCancelResponse {
        cancelled: state.dashboard.cancel_batch(),
    })
}

async fn read_batch_form(
    mut multipart: Multipart,
    defaults: &AnalysisParams,
) -> Result<(Vec<UploadFile>, AnalysisParams)> {
    let mut uploads = Vec::new();
    let mut params = defaults.clone();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "files" {
            let filename = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("upload_{}", uploads.len()));
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::InvalidInput(format!("failed to read '{filename}': {e}")))?;

            let mut upload = UploadFile::new(filename, bytes.to_vec());
            if let Some(content_type) = content_type {
                upload.content_type = content_type;
            }
            uploads.push(upload);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| Error::InvalidInput(format!("failed to read field '{name}': {e}")))?;
        let value = value.trim();

        match name.as_str() {
            "input_type" => params.input_type = value.parse().map_err(Error::InvalidInput)?,
            "theme" => params.theme = value.parse().map_err(Error::InvalidInput)?,
            "threshold" => params.threshold = parse_number(&name, value)?,
            "max_threshold" => params.max_threshold = parse_number(&name, value)?,
            "max_freq" => params.max_freq = parse_number(&name, value)?,
            _ => tracing::debug!(field = %name, "ignoring unknown batch form field"),
        }
    }

    Ok((uploads, params))
}

fn parse_number<T>(field: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| Error::InvalidInput(format!("invalid {field} '{value}': {e}")))
}
