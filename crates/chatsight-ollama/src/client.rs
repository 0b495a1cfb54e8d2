// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for a local Ollama-compatible chat endpoint.
//!
//! One non-streaming request per analysis, raced against a hard timeout.
//! No caching and no retry here: a failed or timed-out candidate is simply
//! eligible again on the orchestrator's next scheduling pass.

use std::time::Duration;

use async_trait::async_trait;
use chatsight_config::model::InferenceConfig;
use chatsight_core::{AnalysisOutcome, ChatsightError, InferenceProvider};
use tracing::debug;

use crate::parse;
use crate::types::{ChatRequest, ChatResponse, ModelOptions, RequestMessage};

/// HTTP client for the inference endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    options: ModelOptions,
    timeout: Duration,
}

impl OllamaClient {
    /// Creates a new inference client from the configured endpoint and
    /// sampling parameters.
    pub fn new(config: &InferenceConfig) -> Result<Self, ChatsightError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChatsightError::Inference {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            options: ModelOptions::from(config),
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Issues the chat request and returns the raw reply text.
    async fn chat(&self, prompt: &str) -> Result<String, ChatsightError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![RequestMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            format: "json".to_string(),
            stream: false,
            options: self.options.clone(),
        };

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatsightError::Inference {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "inference response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatsightError::Inference {
                message: format!("inference endpoint returned {status}: {body}"),
                source: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChatsightError::Inference {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;
        let chat_response: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ChatsightError::Inference {
                message: format!("failed to parse endpoint response: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(chat_response.message.content)
    }
}

#[async_trait]
impl InferenceProvider for OllamaClient {
    /// Sends the prompt and tolerantly parses the reply.
    ///
    /// The whole call races a hard deadline; on expiry the in-flight
    /// request future is dropped. The endpoint may still finish the
    /// request in the background and that result is discarded -- timeout
    /// cancellation is best-effort, not transport-level.
    async fn analyze(&self, prompt: &str) -> Result<AnalysisOutcome, ChatsightError> {
        let reply = tokio::time::timeout(self.timeout, self.chat(prompt))
            .await
            .map_err(|_| ChatsightError::Timeout {
                duration: self.timeout,
            })??;
        Ok(parse::extract_json(&reply))
    }
}
