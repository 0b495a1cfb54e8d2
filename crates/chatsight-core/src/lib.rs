// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chatsight conversation-analysis service.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Chatsight workspace. The storage,
//! resolver, and inference crates implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ChatsightError;
pub use types::{
    Alert, AlertKind, AnalysisOutcome, AnalysisReport, Chat, ChatMessage, NewAlert,
    ProjectConfig, QueueEntry, Session, SessionStatus,
};

// Re-export all adapter traits at crate root.
pub use traits::{InferenceProvider, ProjectResolver, StoreAdapter, TokenProvider};
