// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled conversation analysis for Chatsight.
//!
//! Selects conversations due for analysis, builds a deterministic prompt
//! from the project configuration and the recent transcript, dispatches to
//! the inference endpoint under a bounded concurrency limit, and persists
//! the result. Failed candidates are retried by natural re-selection on
//! the next scheduling pass.

pub mod orchestrator;
pub mod prompt;
pub mod scheduler;

pub use orchestrator::{Analyzer, PassSummary};
pub use prompt::build_prompt;
pub use scheduler::run_scheduler;
