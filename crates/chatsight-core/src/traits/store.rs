// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store adapter trait: typed read/write access to sessions, chats,
//! messages, the alert log, and the durable delivery queues.
//!
//! No business logic lives behind this trait. All writes are single-row
//! upserts/updates; cross-aggregate consistency is not guaranteed, only
//! per-statement atomicity.

use async_trait::async_trait;

use crate::error::ChatsightError;
use crate::types::{Alert, AlertKind, Chat, ChatMessage, NewAlert, QueueEntry, Session, SessionStatus};

/// Persistence seam for both pipelines.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// Opens the backend and runs pending migrations.
    async fn initialize(&self) -> Result<(), ChatsightError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), ChatsightError>;

    // --- Sessions ---

    /// Inserts the session if absent, otherwise refreshes status and last-seen.
    async fn upsert_session(&self, session: &Session) -> Result<(), ChatsightError>;

    async fn get_session(&self, id: &str) -> Result<Option<Session>, ChatsightError>;

    async fn update_session_status(
        &self,
        id: &str,
        status: SessionStatus,
    ) -> Result<(), ChatsightError>;

    /// Links a session to its external project reference.
    async fn link_session_project(
        &self,
        id: &str,
        project_id: &str,
    ) -> Result<(), ChatsightError>;

    /// Increments the session's QR counter and returns the new value.
    /// Reaching `max_attempts` marks the session `auth_failure`.
    async fn record_qr_attempt(
        &self,
        id: &str,
        max_attempts: i64,
    ) -> Result<i64, ChatsightError>;

    // --- Chats ---

    /// Inserts the chat if absent, otherwise refreshes the denormalized
    /// last-message fields and flags.
    async fn upsert_chat(&self, chat: &Chat) -> Result<(), ChatsightError>;

    async fn get_chat(
        &self,
        session_id: &str,
        chat_id: &str,
    ) -> Result<Option<Chat>, ChatsightError>;

    /// Chats due for analysis: non-empty last message and
    /// `last_analysis_ts` null or older than `last_message_ts`, newest
    /// last-message first, capped at `limit`.
    async fn select_analysis_candidates(
        &self,
        limit: i64,
    ) -> Result<Vec<Chat>, ChatsightError>;

    /// Persists the analysis result and stamps `last_analysis_ts`.
    async fn update_chat_analysis(
        &self,
        session_id: &str,
        chat_id: &str,
        analysis: &serde_json::Value,
        analyzed_at: i64,
    ) -> Result<(), ChatsightError>;

    /// Soft-deletes the chat and appends to its deletion history.
    async fn soft_delete_chat(
        &self,
        session_id: &str,
        chat_id: &str,
        deleted_at: i64,
    ) -> Result<(), ChatsightError>;

    // --- Messages ---

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), ChatsightError>;

    /// The `limit` most recent non-deleted messages of a chat, newest first.
    async fn recent_messages(
        &self,
        session_id: &str,
        chat_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, ChatsightError>;

    /// Soft-deletes a message, recording the deletor and timestamp.
    async fn soft_delete_message(
        &self,
        session_id: &str,
        message_id: &str,
        deleted_by: Option<&str>,
        deleted_at: i64,
    ) -> Result<(), ChatsightError>;

    /// Appends the previous body to the edition history and stores the new body.
    async fn record_message_edit(
        &self,
        session_id: &str,
        message_id: &str,
        new_body: &str,
    ) -> Result<(), ChatsightError>;

    // --- Alerts ---

    /// Appends one alert row. The alert log is append-only and tolerates
    /// duplicates from at-least-once redelivery.
    async fn insert_alert(&self, alert: &NewAlert) -> Result<i64, ChatsightError>;

    async fn list_alerts(
        &self,
        session_id: Option<&str>,
        unread_only: bool,
    ) -> Result<Vec<Alert>, ChatsightError>;

    async fn mark_alert_read(&self, id: i64) -> Result<(), ChatsightError>;

    // --- Durable queues ---

    async fn enqueue(&self, kind: AlertKind, payload: &str) -> Result<i64, ChatsightError>;

    /// Delivers the next entry from the kind's queue, locking it until
    /// acked, nacked, or the lock expires. `None` when the queue is empty.
    async fn dequeue(&self, kind: AlertKind) -> Result<Option<QueueEntry>, ChatsightError>;

    /// Acknowledges successful processing; the entry is never redelivered.
    async fn ack(&self, id: i64) -> Result<(), ChatsightError>;

    /// Negative acknowledgment. With `requeue` the entry returns to
    /// delivery (unbounded); without it the entry is dropped permanently.
    async fn nack(&self, id: i64, requeue: bool) -> Result<(), ChatsightError>;
}
