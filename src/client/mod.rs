//! HTTP client for the bat-call classification backend.
//!
//! `ApiClient` methods are grouped by backend area:
//! - [`system`] - health and aggregate statistics
//! - [`history`] - stored results and past batches
//! - [`analysis`] - single-file analysis and the batch progress stream
//! - [`reports`] - CSV/PDF/Excel exports
//! - [`assistant`] - chat and per-result explanations
//!
//! No call is retried; failures surface immediately as [`crate::Error`].

mod analysis;
mod assistant;
mod history;
mod reports;
mod system;


use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::utils::guess_content_type;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

/// Path of the species reference images on the backend
const SPECIES_IMAGE_PATH: &str = "/api/static/bat_species";

/// Longest backend error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

#[allow(clippy::expect_used)]
static WHITESPACE_RUN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("static whitespace pattern"));

/// Client for the classification backend (cheap to clone)
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    stream_timeout: Option<Duration>,
}

impl ApiClient {
    /// Build a client from backend settings
    ///
    /// Timeouts are applied per request rather than on the client so the
    /// batch stream is not cut off by the one-shot timeout.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: Some("backend".to_string()),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            stream_timeout: config.stream_timeout,
        })
    }

    /// Backend base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a backend path such as `/api/stats`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// URL of the reference image for a species
    ///
    /// Whitespace runs and `/` become `_`. An empty name resolves to the
    /// placeholder image.
    pub fn species_image_url(&self, species: &str) -> String {
        let species = species.trim();
        if species.is_empty() {
            return self.endpoint(&format!("{SPECIES_IMAGE_PATH}/placeholder.jpg"));
        }
        let slug = WHITESPACE_RUN.replace_all(species, "_").replace('/', "_");
        self.endpoint(&format!("{SPECIES_IMAGE_PATH}/{slug}"))
    }

    /// Resolve a backend-relative artifact URL (spectrogram, audio)
    ///
    /// Absolute `http(s)` URLs pass through unchanged.
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        self.endpoint(path)
    }

    /// GET `path` and decode the JSON body
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(self.endpoint(path))
            .timeout(self.timeout)
            .send()
            .await?;
        read_json(check_status(response, path).await?, path).await
    }

    /// Send a prepared request with the one-shot timeout and decode the JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T> {
        let response = request.timeout(self.timeout).send().await?;
        read_json(check_status(response, path).await?, path).await
    }
}

/// Turn a non-success response into [`Error::Backend`]
pub(crate) async fn check_status(
    response: reqwest::Response,
    path: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("no reason").to_string()
    } else {
        crate::utils::truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS)
    };

    tracing::warn!(endpoint = path, status = status.as_u16(), "backend request failed");
    Err(Error::Backend {
        endpoint: path.to_string(),
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| Error::InvalidResponse {
        endpoint: path.to_string(),
        reason: e.to_string(),
    })
}

/// A file to upload for analysis
#[derive(Clone, Debug)]
pub struct UploadFile {
    /// Filename sent to the backend
    pub filename: String,
    /// MIME type of the part
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Wrap in-memory contents; the content type is guessed from the extension
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename).to_string();
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("not a file path: {}", path.display()))
            })?
            .to_string();

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read upload '{}': {}", path.display(), e),
            ))
        })?;

        Ok(Self::new(filename, bytes))
    }

    /// Convert into a multipart part
    pub(crate) fn into_part(self) -> Result<reqwest::multipart::Part> {
        let UploadFile {
            filename,
            content_type,
            bytes,
        } = self;
        reqwest::multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str(&content_type)
            .map_err(|e| Error::InvalidInput(format!("invalid content type '{content_type}': {e}")))
    }
}
