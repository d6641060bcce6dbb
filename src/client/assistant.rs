//! Chat assistant and per-result explanations.

use super::ApiClient;
use crate::error::{Error, Result};
use crate::types::{AnalysisResult, CallParameters, SpeciesDetected, Statistics};
use serde::{Deserialize, Serialize};

const CHAT_PATH: &str = "/api/chat";
const EXPLAIN_PATH: &str = "/api/explain";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [AnalysisResult],
    statistics: &'a Statistics,
}

#[derive(Deserialize)]
struct ChatReply {
    response: Option<String>,
}

#[derive(Serialize)]
struct ExplainRequest<'a> {
    filename: &'a str,
    species_detected: &'a [SpeciesDetected],
    call_parameters: &'a CallParameters,
}

#[derive(Deserialize)]
struct ExplainReply {
    explanation: Option<String>,
}

fn missing_field(endpoint: &str, field: &str) -> Error {
    Error::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: format!("missing `{field}` field"),
    }
}

impl ApiClient {
    /// Ask the assistant a question, grounded in the given results and statistics
    pub async fn chat(
        &self,
        message: &str,
        history: &[AnalysisResult],
        statistics: &Statistics,
    ) -> Result<String> {
        let request = ChatRequest {
            message,
            history,
            statistics,
        };
        let reply: ChatReply = self
            .send_json(self.http.post(self.endpoint(CHAT_PATH)).json(&request), CHAT_PATH)
            .await?;
        reply.response.ok_or_else(|| missing_field(CHAT_PATH, "response"))
    }

    /// Plain-language explanation of one result
    pub async fn explain(&self, result: &AnalysisResult) -> Result<String> {
        let request = ExplainRequest {
            filename: &result.original_filename,
            species_detected: &result.species_detected,
            call_parameters: &result.call_parameters,
        };
        let reply: ExplainReply = self
            .send_json(
                self.http.post(self.endpoint(EXPLAIN_PATH)).json(&request),
                EXPLAIN_PATH,
            )
            .await?;
        reply
            .explanation
            .ok_or_else(|| missing_field(EXPLAIN_PATH, "explanation"))
    }
}
