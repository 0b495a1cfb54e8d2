// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Chatsight pipelines.

use thiserror::Error;

/// The primary error type used across all Chatsight adapter traits and
/// pipeline operations.
#[derive(Debug, Error)]
pub enum ChatsightError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Project configuration resolver errors (HTTP failure, bad response, auth).
    #[error("resolver error: {message}")]
    Resolver {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Inference endpoint errors (transport failure, non-success status).
    ///
    /// Distinct from [`ChatsightError::Timeout`]: an inference call that
    /// exceeds its deadline never surfaces as an `Inference` error.
    #[error("inference error: {message}")]
    Inference {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A referenced entity does not exist in the store.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The session has no linked project reference, so it cannot be analyzed.
    #[error("session {session_id} has no linked project")]
    ProjectUnlinked { session_id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
