// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inference provider trait for local LLM endpoints.

use async_trait::async_trait;

use crate::error::ChatsightError;
use crate::types::AnalysisOutcome;

/// Sends a prompt to the inference endpoint and returns the tolerantly
/// parsed result.
///
/// An unparseable reply is an `Ok(AnalysisOutcome::Unparsed { .. })`, not an
/// error; `Err` is reserved for timeouts and transport/endpoint failures.
/// No caching and no internal retry -- retry belongs to the orchestrator's
/// next scheduling pass.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn analyze(&self, prompt: &str) -> Result<AnalysisOutcome, ChatsightError>;
}
