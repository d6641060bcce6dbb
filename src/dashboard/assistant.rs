//! Chat transcript kept alongside the backend assistant.

use crate::error::{Error, Result};
use crate::types::{ChatMessage, ChatRole};

use super::Dashboard;

/// Reply recorded in the transcript when the assistant call fails
const CHAT_FAILURE_REPLY: &str = "Sorry, I encountered an error. Please try again.";

impl Dashboard {
    /// Ask the assistant a question about the cached results and statistics
    ///
    /// The question and the reply are appended to the transcript. On failure
    /// an apology is appended instead and the error is returned.
    pub async fn chat(&self, message: &str) -> Result<ChatMessage> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::InvalidInput("chat message is empty".to_string()));
        }

        self.transcript.write().await.push(ChatMessage {
            role: ChatRole::User,
            content: message.to_string(),
        });

        let view = self.view().await;
        let statistics = view.statistics.unwrap_or_default();

        let (reply, outcome) = match self.client.chat(message, &view.results, &statistics).await {
            Ok(content) => {
                let reply = ChatMessage {
                    role: ChatRole::Assistant,
                    content,
                };
                (reply.clone(), Ok(reply))
            }
            Err(e) => {
                tracing::warn!(error = %e, "assistant request failed");
                let reply = ChatMessage {
                    role: ChatRole::Assistant,
                    content: CHAT_FAILURE_REPLY.to_string(),
                };
                (reply, Err(e))
            }
        };

        self.transcript.write().await.push(reply);
        outcome
    }

    /// Chat messages so far, oldest first
    pub async fn chat_transcript(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.clone()
    }

    /// Forget the chat transcript
    pub async fn clear_chat(&self) {
        self.transcript.write().await.clear();
    }
}
