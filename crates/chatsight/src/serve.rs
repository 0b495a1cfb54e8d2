// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chatsight serve` command implementation.
//!
//! Wires the SQLite store, the per-kind alert queue consumers, and the
//! recurring analysis scheduler, then runs until SIGINT/SIGTERM. Both
//! subsystems share the store and stop on one cancellation token; the
//! store is closed (WAL checkpoint) only after both have drained.

use std::sync::Arc;
use std::time::Duration;

use chatsight_analyzer::{run_scheduler, Analyzer};
use chatsight_config::model::ChatsightConfig;
use chatsight_core::{ChatsightError, StoreAdapter};
use chatsight_ingest::AlertConsumer;
use chatsight_ollama::OllamaClient;
use chatsight_projects::{token_provider_from_config, ProjectsClient};
use chatsight_storage::SqliteStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Runs the `chatsight serve` command.
pub async fn run_serve(config: ChatsightConfig) -> Result<(), ChatsightError> {
    init_tracing(&config.log.level);
    info!("starting chatsight serve");

    // Storage first: everything else hangs off it.
    let store: Arc<dyn StoreAdapter> =
        Arc::new(SqliteStore::new(config.storage.clone(), &config.ingest));
    store.initialize().await?;

    // Upstream clients.
    let tokens = token_provider_from_config(&config.projects)?;
    let projects = Arc::new(ProjectsClient::new(&config.projects, tokens)?);
    let inference = Arc::new(OllamaClient::new(&config.inference)?);
    debug!(
        inference_host = config.inference.host.as_str(),
        projects_base_url = config.projects.base_url.as_str(),
        "upstream clients ready"
    );

    // The two pipelines.
    let consumer = Arc::new(AlertConsumer::new(store.clone(), &config.ingest));
    let analyzer = Arc::new(Analyzer::new(
        store.clone(),
        projects,
        inference,
        config.analysis.clone(),
    ));

    let cancel = install_signal_handler();
    let consumer_task = tokio::spawn(consumer.run(cancel.clone()));
    let scheduler_task = tokio::spawn(run_scheduler(
        analyzer,
        Duration::from_secs(config.analysis.interval_secs),
        cancel.clone(),
    ));

    // Run until the shutdown signal, then drain both subsystems.
    let (consumer_result, scheduler_result) = tokio::join!(consumer_task, scheduler_task);
    consumer_result.map_err(|e| ChatsightError::Internal(format!("consumer task panicked: {e}")))?;
    scheduler_result
        .map_err(|e| ChatsightError::Internal(format!("scheduler task panicked: {e}")))?;

    store.close().await?;
    info!("chatsight stopped");
    Ok(())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

/// Initializes the tracing subscriber with an env-filter default.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatsight={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
