// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response types for the Ollama chat API.

use chatsight_config::model::InferenceConfig;
use serde::{Deserialize, Serialize};

/// A non-streaming chat request with JSON-formatted output.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    /// Always `"json"`: the endpoint constrains the reply to JSON output.
    pub format: String,
    pub stream: bool,
    pub options: ModelOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: String,
}

/// Sampling parameters, fixed per deployment via [`InferenceConfig`].
#[derive(Debug, Clone, Serialize)]
pub struct ModelOptions {
    pub num_ctx: u32,
    pub num_predict: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub num_thread: u32,
}

impl From<&InferenceConfig> for ModelOptions {
    fn from(config: &InferenceConfig) -> Self {
        Self {
            num_ctx: config.num_ctx,
            num_predict: config.num_predict,
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            num_thread: config.num_thread,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_serializes_wire_shape() {
        let request = ChatRequest {
            model: "llama3.1:8b".into(),
            messages: vec![RequestMessage {
                role: "user".into(),
                content: "analyze this".into(),
            }],
            format: "json".into(),
            stream: false,
            options: ModelOptions::from(&InferenceConfig::default()),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["options"]["num_ctx"], 4096);
        assert_eq!(value["options"]["num_thread"], 4);
    }

    #[test]
    fn chat_response_deserializes_wire_shape() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"{}"}}"#).unwrap();
        assert_eq!(response.message.content, "{}");
    }
}
