//! Single-file analysis and the batch progress stream.

use super::{ApiClient, UploadFile, check_status};
use crate::config::AnalysisParams;
use crate::error::{BatchError, Error, Result};
use crate::types::{AnalysisResult, InputType};
use reqwest::multipart::Form;
use serde_json::Value;

const BATCH_PATH: &str = "/api/analyze/batch";

/// Attach the analysis fields shared by single and batch uploads
fn with_params(form: Form, params: &AnalysisParams) -> Form {
    form.text("theme", params.theme.as_str())
        .text("threshold", params.threshold.to_string())
        .text("max_threshold", params.max_threshold.to_string())
        .text("max_freq", params.max_freq.to_string())
}

/// Pull the result out of an analyze response
///
/// Depending on backend version the result sits under `result`, under
/// `data`, or is the body itself.
fn unwrap_result_payload(body: Value) -> Value {
    match body {
        Value::Object(mut map) => {
            for key in ["result", "data"] {
                if let Some(inner) = map.remove(key)
                    && inner.is_object()
                {
                    return inner;
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

impl ApiClient {
    /// Analyze a single recording or spectrogram image
    pub async fn analyze(
        &self,
        upload: UploadFile,
        params: &AnalysisParams,
    ) -> Result<AnalysisResult> {
        let path = match params.input_type {
            InputType::Audio => "/api/analyze/audio",
            InputType::Spectrogram => "/api/analyze/spectrogram",
        };
        let filename = upload.filename.clone();
        let form = with_params(Form::new().part("file", upload.into_part()?), params);

        tracing::debug!(filename = %filename, endpoint = path, "submitting file for analysis");

        let body: Value = self
            .send_json(self.http.post(self.endpoint(path)).multipart(form), path)
            .await?;

        let result: AnalysisResult =
            serde_json::from_value(unwrap_result_payload(body)).map_err(|e| {
                Error::InvalidResponse {
                    endpoint: path.to_string(),
                    reason: e.to_string(),
                }
            })?;

        tracing::info!(
            filename = %filename,
            file_id = %result.file_id,
            top_species = ?result.top_species().map(|s| &s.species),
            "analysis complete"
        );
        Ok(result)
    }

    /// Submit a batch and return the open progress stream
    ///
    /// Fails with [`BatchError::StreamUnavailable`] when the request is
    /// rejected or cannot be sent; nothing is read from the body here.
    pub async fn open_batch_stream(
        &self,
        uploads: Vec<UploadFile>,
        params: &AnalysisParams,
    ) -> Result<reqwest::Response> {
        if uploads.is_empty() {
            return Err(BatchError::NoFiles.into());
        }

        let file_count = uploads.len();
        let mut form = Form::new();
        for upload in uploads {
            form = form.part("files", upload.into_part()?);
        }
        let form = with_params(form.text("input_type", params.input_type.as_str()), params);

        let mut request = self.http.post(self.endpoint(BATCH_PATH)).multipart(form);
        if let Some(timeout) = self.stream_timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| BatchError::StreamUnavailable {
            reason: e.to_string(),
        })?;

        let response = check_status(response, BATCH_PATH).await.map_err(|e| match e {
            Error::Backend {
                status, message, ..
            } => BatchError::StreamUnavailable {
                reason: format!("HTTP {status}: {message}"),
            }
            .into(),
            other => other,
        })?;

        tracing::info!(files = file_count, "batch stream opened");
        Ok(response)
    }
}
