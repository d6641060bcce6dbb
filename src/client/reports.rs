//! Report and data exports.

use super::{ApiClient, check_status};
use crate::error::{Error, Result};
use crate::types::{Download, ExportFormat};
use crate::utils::filename_from_headers;
use reqwest::header::CONTENT_TYPE;

fn unsupported(scope: &str, format: ExportFormat) -> Error {
    Error::InvalidInput(format!("{format:?} export is not available for {scope}"))
}

impl ApiClient {
    /// Every stored result as one CSV file
    pub async fn export_all(&self, format: ExportFormat) -> Result<Download> {
        match format {
            ExportFormat::Csv => {
                let fallback = format!(
                    "bat_analysis_{}.csv",
                    chrono::Utc::now().format("%Y-%m-%d")
                );
                self.download("/api/download/csv", fallback).await
            }
            other => Err(unsupported("all results", other)),
        }
    }

    /// One result as a PDF report or Excel workbook
    pub async fn export_result(&self, file_id: &str, format: ExportFormat) -> Result<Download> {
        let encoded = urlencoding::encode(file_id);
        let (path, fallback) = match format {
            ExportFormat::Pdf => (
                format!("/api/download/pdf/{encoded}"),
                format!("bat_report_{file_id}.pdf"),
            ),
            ExportFormat::Excel => (
                format!("/api/download/excel/{encoded}"),
                format!("bat_analysis_{file_id}.xlsx"),
            ),
            ExportFormat::Csv => return Err(unsupported("a single result", format)),
        };
        self.download(&path, fallback).await
    }

    /// All results of a past batch as a PDF report or Excel workbook
    pub async fn export_batch(&self, batch_id: &str, format: ExportFormat) -> Result<Download> {
        let encoded = urlencoding::encode(batch_id);
        let (path, fallback) = match format {
            ExportFormat::Pdf => (
                format!("/api/download/batch/{encoded}/pdf"),
                format!("bat_batch_{batch_id}.pdf"),
            ),
            ExportFormat::Excel => (
                format!("/api/download/batch/{encoded}/excel"),
                format!("bat_batch_{batch_id}.xlsx"),
            ),
            ExportFormat::Csv => return Err(unsupported("a batch", format)),
        };
        self.download(&path, fallback).await
    }

    /// Aggregate report over every stored result
    pub async fn export_report(&self, format: ExportFormat) -> Result<Download> {
        let (path, fallback) = match format {
            ExportFormat::Pdf => ("/api/download-reports/pdf", "bat_report.pdf"),
            ExportFormat::Csv => ("/api/download-reports/csv", "bat_report.csv"),
            ExportFormat::Excel => return Err(unsupported("aggregate reports", format)),
        };
        self.download(path, fallback.to_string()).await
    }

    /// GET a binary body; the server's `Content-Disposition` name wins over `fallback`
    async fn download(&self, path: &str, fallback: String) -> Result<Download> {
        let response = self
            .http
            .get(self.endpoint(path))
            .timeout(self.timeout)
            .send()
            .await?;
        let response = check_status(response, path).await?;

        let filename = filename_from_headers(response.headers()).unwrap_or(fallback);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        tracing::info!(endpoint = path, filename = %filename, size = bytes.len(), "export downloaded");
        Ok(Download {
            filename,
            content_type,
            bytes,
        })
    }
}
