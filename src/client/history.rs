//! Stored results and past batches.

use super::{ApiClient, check_status};
use crate::error::Result;
use crate::types::{AnalysisResult, BatchMetadata};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct ResultsEnvelope {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

impl ResultsEnvelope {
    /// Decode each record on its own so one odd record cannot sink the list
    fn into_results(self) -> Vec<AnalysisResult> {
        self.results
            .unwrap_or_default()
            .iter()
            .filter_map(AnalysisResult::from_payload)
            .collect()
    }
}

#[derive(Deserialize)]
struct BatchesEnvelope {
    #[serde(default)]
    batches: Option<Vec<BatchMetadata>>,
}

impl ApiClient {
    /// Every stored analysis result
    ///
    /// A body without a `results` list is treated as empty. Null entries
    /// are dropped.
    pub async fn results(&self) -> Result<Vec<AnalysisResult>> {
        let envelope: ResultsEnvelope = self.get_json("/api/results").await?;
        Ok(envelope.into_results())
    }

    /// Delete one stored result
    pub async fn delete_result(&self, file_id: &str) -> Result<()> {
        let path = format!("/api/results/{}", urlencoding::encode(file_id));
        let response = self
            .http
            .delete(self.endpoint(&path))
            .timeout(self.timeout)
            .send()
            .await?;
        check_status(response, &path).await?;

        tracing::info!(file_id, "deleted analysis result");
        Ok(())
    }

    /// Past batches recorded by the backend
    pub async fn batches(&self) -> Result<Vec<BatchMetadata>> {
        let envelope: BatchesEnvelope = self.get_json("/api/batches").await?;
        Ok(envelope.batches.unwrap_or_default())
    }

    /// Results stored for one past batch
    pub async fn batch_results(&self, batch_id: &str) -> Result<Vec<AnalysisResult>> {
        let path = format!("/api/batches/{}", urlencoding::encode(batch_id));
        let envelope: ResultsEnvelope = self.get_json(&path).await?;
        Ok(envelope.into_results())
    }
}
