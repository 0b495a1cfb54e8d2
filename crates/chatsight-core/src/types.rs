// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Chatsight pipelines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a messaging-account session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    QrGenerated,
    Authenticated,
    Ready,
    Disconnected,
    Closed,
    AuthFailure,
    Error,
}

/// Discriminator for alert records and their ingestion queues.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Disconnected,
    MessageDeleted,
    MessageEdited,
    ChatRemoved,
}

impl AlertKind {
    /// All alert kinds, in queue-declaration order.
    pub const ALL: [AlertKind; 4] = [
        AlertKind::Disconnected,
        AlertKind::MessageDeleted,
        AlertKind::MessageEdited,
        AlertKind::ChatRemoved,
    ];

    /// Name of the durable queue carrying this alert kind.
    pub fn queue_name(&self) -> String {
        format!("alerts.{self}")
    }
}

/// One logical messaging-account connection.
///
/// Created on first contact, mutated on every lifecycle event, never
/// hard-deleted (terminal states are `closed`/`disconnected`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique string identifier for the session.
    pub id: String,
    pub title: Option<String>,
    /// Reference to the external project/group this session belongs to.
    /// `None` means the session's conversations cannot be analyzed.
    pub project_id: Option<String>,
    pub status: SessionStatus,
    pub last_seen_at: Option<String>,
    pub qr_attempts: i64,
    pub disconnected_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One conversation thread within a session, keyed by (session_id, chat_id).
///
/// Carries denormalized last-message fields so candidate selection never has
/// to join against the messages table, plus the analysis result and the
/// timestamp of the last completed analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub session_id: String,
    pub chat_id: String,
    pub name: Option<String>,
    pub is_group: bool,
    pub archived: bool,
    pub pinned: bool,
    pub muted: bool,
    pub deleted: bool,
    /// Unix-milli timestamps of every soft deletion, oldest first.
    pub deletion_history: Vec<i64>,
    pub last_message_body: Option<String>,
    /// Unix millis of the most recent message.
    pub last_message_ts: Option<i64>,
    pub last_message_from_me: bool,
    /// Structured analysis result from the inference step, opaque to storage.
    pub analysis: Option<serde_json::Value>,
    /// Unix millis of the last completed analysis. Null or strictly less
    /// than `last_message_ts` means the chat is due for (re-)analysis.
    pub last_analysis_ts: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// One message within a chat, keyed by (session_id, message_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub session_id: String,
    pub message_id: String,
    pub chat_id: String,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub author: Option<String>,
    pub from_me: bool,
    /// Message text. `None` for media-only messages.
    pub body: Option<String>,
    /// Unix millis.
    pub timestamp: i64,
    pub deleted: bool,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<i64>,
    /// Previous bodies, oldest first. Appended on edit, never on delete.
    pub editions: Vec<String>,
    pub created_at: String,
}

/// A new alert record, as produced by the ingestion consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub kind: AlertKind,
    /// Opaque store reference for the session (the wire `session` field).
    pub session_ref: String,
    /// String identifier of the session (the wire `sessionId` field).
    pub session_id: String,
    pub chat_id: Option<String>,
    pub message_id: Option<String>,
    /// Unix millis of the triggering event, where the event carries one.
    pub event_ts: Option<i64>,
    /// Human-readable description of the event.
    pub body: String,
}

/// A persisted alert row. Immutable once created except for read-state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub kind: AlertKind,
    pub session_ref: String,
    pub session_id: String,
    pub chat_id: Option<String>,
    pub message_id: Option<String>,
    pub event_ts: Option<i64>,
    pub body: String,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

/// An entry delivered from a durable queue.
///
/// A dequeued entry stays in `processing` until acked or nacked; an expired
/// lock returns it to delivery (at-least-once).
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    pub status: String,
    pub attempts: i64,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

/// Result of an inference call after tolerant parsing.
///
/// `Unparsed` is a valid, degraded analysis result -- not an error. Callers
/// must be able to distinguish "analyzed but unparseable" from "not yet
/// analyzed", so the raw reply is preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The reply parsed (possibly after markdown-fence cleanup) into JSON.
    Parsed(serde_json::Value),
    /// The reply did not parse even after cleanup.
    Unparsed { raw: String, error: String },
}

impl AnalysisOutcome {
    /// The value persisted onto the chat row.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            AnalysisOutcome::Parsed(value) => value.clone(),
            AnalysisOutcome::Unparsed { raw, error } => serde_json::json!({
                "raw": raw,
                "error": error,
            }),
        }
    }
}

/// Envelope returned by the on-demand analysis trigger.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub success: bool,
    pub chat_id: String,
    pub analysis: serde_json::Value,
}

/// Project configuration resolved from the upstream service.
///
/// Drives prompt construction: instructions, the fields to extract, the
/// desired output shape, and example analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Field name to description. BTreeMap keeps prompt rendering
    /// deterministic regardless of wire-object key order.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub output_format: serde_json::Value,
    #[serde(default)]
    pub example_analysis: Vec<serde_json::Value>,
}
