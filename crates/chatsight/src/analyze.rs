// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatsight analyze` command implementation.
//!
//! On-demand analysis of one conversation. Prints the result envelope as
//! JSON on success; failures (no linked project, resolver or inference
//! errors, timeouts) propagate to the caller and exit non-zero.

use std::sync::Arc;

use chatsight_analyzer::Analyzer;
use chatsight_config::model::ChatsightConfig;
use chatsight_core::{ChatsightError, StoreAdapter};
use chatsight_ollama::OllamaClient;
use chatsight_projects::{token_provider_from_config, ProjectsClient};
use chatsight_storage::SqliteStore;
use tracing::info;

/// Runs the `chatsight analyze <session-id> <chat-id>` command.
pub async fn run_analyze(
    config: ChatsightConfig,
    session_id: &str,
    chat_id: &str,
) -> Result<(), ChatsightError> {
    crate::serve::init_tracing(&config.log.level);

    let store: Arc<dyn StoreAdapter> =
        Arc::new(SqliteStore::new(config.storage.clone(), &config.ingest));
    store.initialize().await?;

    let tokens = token_provider_from_config(&config.projects)?;
    let projects = Arc::new(ProjectsClient::new(&config.projects, tokens)?);
    let inference = Arc::new(OllamaClient::new(&config.inference)?);
    let analyzer = Analyzer::new(store.clone(), projects, inference, config.analysis.clone());

    let report = analyzer.analyze_conversation(session_id, chat_id).await?;
    info!(session_id, chat_id, "on-demand analysis complete");

    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|e| ChatsightError::Internal(format!("failed to render report: {e}")))?;
    println!("{rendered}");

    store.close().await?;
    Ok(())
}
