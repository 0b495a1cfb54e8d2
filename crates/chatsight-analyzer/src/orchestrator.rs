// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis orchestration: candidate selection and per-conversation
//! analysis with bounded concurrency.
//!
//! Failures never use an explicit retry counter. A failed candidate keeps
//! its previous `last_analysis_ts`, so the next scheduling pass naturally
//! re-selects it.

use std::sync::Arc;

use chatsight_config::model::AnalysisConfig;
use chatsight_core::{
    AnalysisReport, ChatsightError, InferenceProvider, ProjectResolver, StoreAdapter,
};
use futures::StreamExt;
use tracing::{debug, error, info};

use crate::prompt;

/// Outcome counts for one scheduling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Candidates selected this pass (bounded by the batch size).
    pub selected: usize,
    /// Candidates analyzed and persisted.
    pub analyzed: usize,
    /// Candidates that failed and stay eligible for the next pass.
    pub failed: usize,
}

/// Drives candidate selection and per-conversation analysis.
pub struct Analyzer {
    store: Arc<dyn StoreAdapter>,
    projects: Arc<dyn ProjectResolver>,
    inference: Arc<dyn InferenceProvider>,
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(
        store: Arc<dyn StoreAdapter>,
        projects: Arc<dyn ProjectResolver>,
        inference: Arc<dyn InferenceProvider>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            store,
            projects,
            inference,
            config,
        }
    }

    /// Run one scheduling pass.
    ///
    /// Selects up to `batch_size` due conversations and analyzes them with
    /// at most `concurrency` in flight. One candidate's failure is logged
    /// and never aborts the rest of the batch.
    pub async fn run_pass(&self) -> PassSummary {
        let candidates = match self
            .store
            .select_analysis_candidates(self.config.batch_size)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(error = %e, "candidate selection failed, skipping pass");
                return PassSummary::default();
            }
        };

        let mut summary = PassSummary {
            selected: candidates.len(),
            ..PassSummary::default()
        };
        if candidates.is_empty() {
            debug!("no conversations due for analysis");
            return summary;
        }
        info!(candidates = summary.selected, "analysis pass started");

        let mut results = futures::stream::iter(candidates.into_iter().map(|chat| {
            async move {
                let result = self
                    .analyze_conversation(&chat.session_id, &chat.chat_id)
                    .await;
                (chat, result)
            }
        }))
        .buffer_unordered(self.config.concurrency);

        while let Some((chat, result)) = results.next().await {
            match result {
                Ok(_) => {
                    summary.analyzed += 1;
                }
                Err(e) => {
                    // The chat keeps its previous last_analysis_ts and is
                    // re-selected next pass.
                    error!(
                        session_id = chat.session_id.as_str(),
                        chat_id = chat.chat_id.as_str(),
                        error = %e,
                        "conversation analysis failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            analyzed = summary.analyzed,
            failed = summary.failed,
            "analysis pass finished"
        );
        summary
    }

    /// Analyze one conversation and persist the result.
    ///
    /// Also the on-demand entry point: errors propagate to the caller
    /// unchanged, and a timeout leaves the chat's `last_analysis_ts`
    /// untouched.
    pub async fn analyze_conversation(
        &self,
        session_id: &str,
        chat_id: &str,
    ) -> Result<AnalysisReport, ChatsightError> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or_else(|| ChatsightError::NotFound {
                entity: "session",
                id: session_id.to_string(),
            })?;
        let project_id = session
            .project_id
            .ok_or_else(|| ChatsightError::ProjectUnlinked {
                session_id: session_id.to_string(),
            })?;

        let project = self.projects.project_config(&project_id).await?;

        // Newest-first window, reversed to chronological order for the
        // prompt. The window caps prompt size regardless of chat length.
        let mut transcript = self
            .store
            .recent_messages(session_id, chat_id, self.config.max_messages)
            .await?;
        transcript.reverse();

        let prompt = prompt::build_prompt(&project, &transcript);
        debug!(
            session_id,
            chat_id,
            messages = transcript.len(),
            prompt_bytes = prompt.len(),
            "dispatching analysis"
        );

        let outcome = self.inference.analyze(&prompt).await?;
        let analysis = outcome.to_value();

        // Unconditional write: a message arriving mid-analysis advances
        // last_message_ts past this stamp and re-queues the chat.
        let analyzed_at = chrono::Utc::now().timestamp_millis();
        self.store
            .update_chat_analysis(session_id, chat_id, &analysis, analyzed_at)
            .await?;

        info!(session_id, chat_id, "conversation analyzed");
        Ok(AnalysisReport {
            success: true,
            chat_id: chat_id.to_string(),
            analysis,
        })
    }
}
