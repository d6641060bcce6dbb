//! Single-file analysis, deletion, and explanations.

use crate::batch::RefreshHandler;
use crate::client::UploadFile;
use crate::config::AnalysisParams;
use crate::error::{Error, Result};
use crate::types::{AnalysisResult, Event};

use super::Dashboard;

impl Dashboard {
    /// Analyze one file, then refresh statistics and history in the background
    pub async fn analyze_file(
        &self,
        upload: UploadFile,
        params: &AnalysisParams,
    ) -> Result<AnalysisResult> {
        params.validate()?;

        let result = self.client.analyze(upload, params).await?;

        self.emit_event(Event::AnalysisComplete {
            file_id: result.file_id.clone(),
            filename: result.original_filename.clone(),
        });
        self.request_statistics_refresh();
        self.request_results_refresh();

        Ok(result)
    }

    /// Delete a stored result, then refresh statistics and history
    ///
    /// The result disappears from the cached history immediately.
    pub async fn delete_result(&self, file_id: &str) -> Result<()> {
        self.client.delete_result(file_id).await?;

        self.view
            .write()
            .await
            .results
            .retain(|r| r.file_id != file_id);

        self.emit_event(Event::ResultDeleted {
            file_id: file_id.to_string(),
        });
        self.request_statistics_refresh();
        self.request_results_refresh();
        Ok(())
    }

    /// Find a result by ID in the cached history or the current batch
    pub async fn find_result(&self, file_id: &str) -> Option<AnalysisResult> {
        if let Some(found) = self
            .view
            .read()
            .await
            .results
            .iter()
            .find(|r| r.file_id == file_id)
        {
            return Some(found.clone());
        }

        self.batch
            .store
            .read()
            .await
            .results()
            .find(|r| r.file_id == file_id)
            .cloned()
    }

    /// Ask the backend to explain a known result
    pub async fn explain(&self, file_id: &str) -> Result<String> {
        let result = self
            .find_result(file_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("result {file_id}")))?;
        self.client.explain(&result).await
    }
}
