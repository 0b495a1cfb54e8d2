// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recurring scheduler for analysis passes.
//!
//! Each tick spawns its pass as an independent task: a batch that outlives
//! the interval overlaps the next tick. Candidate selection re-queries
//! live state every pass and the analysis stamp is last-writer-wins, so
//! duplicate concurrent analysis of one chat is possible and
//! self-correcting.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::orchestrator::Analyzer;

/// Runs analysis passes every `interval` until the token is cancelled.
///
/// The first pass fires immediately. On cancellation, passes already in
/// flight are drained before returning.
pub async fn run_scheduler(
    analyzer: Arc<Analyzer>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut passes: JoinSet<()> = JoinSet::new();
    info!(interval_secs = interval.as_secs(), "analysis scheduler running");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let analyzer = analyzer.clone();
                passes.spawn(async move {
                    let summary = analyzer.run_pass().await;
                    debug!(
                        selected = summary.selected,
                        analyzed = summary.analyzed,
                        failed = summary.failed,
                        "scheduled pass complete"
                    );
                });
            }
            Some(_) = passes.join_next() => {
                // Reap finished passes so the set stays small.
            }
            _ = cancel.cancelled() => {
                info!("shutdown signal received, stopping analysis scheduler");
                break;
            }
        }
    }

    // Drain in-flight passes before returning.
    while passes.join_next().await.is_some() {}
    info!("analysis scheduler stopped");
}
