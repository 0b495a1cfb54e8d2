// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StoreAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use chatsight_config::model::{IngestConfig, StorageConfig};
use chatsight_core::{
    Alert, AlertKind, Chat, ChatMessage, ChatsightError, NewAlert, QueueEntry, Session,
    SessionStatus, StoreAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`StoreAdapter::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    lock_timeout_secs: u64,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// The database connection is not opened until [`StoreAdapter::initialize`]
    /// is called. `ingest.lock_timeout_secs` governs how long a dequeued
    /// entry stays locked before redelivery.
    pub fn new(config: StorageConfig, ingest: &IngestConfig) -> Self {
        Self {
            config,
            lock_timeout_secs: ingest.lock_timeout_secs,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not
    /// initialized.
    fn db(&self) -> Result<&Database, ChatsightError> {
        self.db.get().ok_or_else(|| ChatsightError::Storage {
            source: "store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl StoreAdapter for SqliteStore {
    async fn initialize(&self) -> Result<(), ChatsightError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ChatsightError::Storage {
            source: "store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ChatsightError> {
        self.db()?.close().await
    }

    // --- Sessions ---

    async fn upsert_session(&self, session: &Session) -> Result<(), ChatsightError> {
        queries::sessions::upsert_session(self.db()?, session).await
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, ChatsightError> {
        queries::sessions::get_session(self.db()?, id).await
    }

    async fn update_session_status(
        &self,
        id: &str,
        status: SessionStatus,
    ) -> Result<(), ChatsightError> {
        queries::sessions::update_session_status(self.db()?, id, status).await
    }

    async fn link_session_project(
        &self,
        id: &str,
        project_id: &str,
    ) -> Result<(), ChatsightError> {
        queries::sessions::link_session_project(self.db()?, id, project_id).await
    }

    async fn record_qr_attempt(
        &self,
        id: &str,
        max_attempts: i64,
    ) -> Result<i64, ChatsightError> {
        queries::sessions::record_qr_attempt(self.db()?, id, max_attempts).await
    }

    // --- Chats ---

    async fn upsert_chat(&self, chat: &Chat) -> Result<(), ChatsightError> {
        queries::chats::upsert_chat(self.db()?, chat).await
    }

    async fn get_chat(
        &self,
        session_id: &str,
        chat_id: &str,
    ) -> Result<Option<Chat>, ChatsightError> {
        queries::chats::get_chat(self.db()?, session_id, chat_id).await
    }

    async fn select_analysis_candidates(
        &self,
        limit: i64,
    ) -> Result<Vec<Chat>, ChatsightError> {
        queries::chats::select_analysis_candidates(self.db()?, limit).await
    }

    async fn update_chat_analysis(
        &self,
        session_id: &str,
        chat_id: &str,
        analysis: &serde_json::Value,
        analyzed_at: i64,
    ) -> Result<(), ChatsightError> {
        queries::chats::update_chat_analysis(self.db()?, session_id, chat_id, analysis, analyzed_at)
            .await
    }

    async fn soft_delete_chat(
        &self,
        session_id: &str,
        chat_id: &str,
        deleted_at: i64,
    ) -> Result<(), ChatsightError> {
        queries::chats::soft_delete_chat(self.db()?, session_id, chat_id, deleted_at).await
    }

    // --- Messages ---

    async fn insert_message(&self, message: &ChatMessage) -> Result<(), ChatsightError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        chat_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, ChatsightError> {
        queries::messages::recent_messages(self.db()?, session_id, chat_id, limit).await
    }

    async fn soft_delete_message(
        &self,
        session_id: &str,
        message_id: &str,
        deleted_by: Option<&str>,
        deleted_at: i64,
    ) -> Result<(), ChatsightError> {
        queries::messages::soft_delete_message(self.db()?, session_id, message_id, deleted_by, deleted_at)
            .await
    }

    async fn record_message_edit(
        &self,
        session_id: &str,
        message_id: &str,
        new_body: &str,
    ) -> Result<(), ChatsightError> {
        queries::messages::record_message_edit(self.db()?, session_id, message_id, new_body).await
    }

    // --- Alerts ---

    async fn insert_alert(&self, alert: &NewAlert) -> Result<i64, ChatsightError> {
        queries::alerts::insert_alert(self.db()?, alert).await
    }

    async fn list_alerts(
        &self,
        session_id: Option<&str>,
        unread_only: bool,
    ) -> Result<Vec<Alert>, ChatsightError> {
        queries::alerts::list_alerts(self.db()?, session_id, unread_only).await
    }

    async fn mark_alert_read(&self, id: i64) -> Result<(), ChatsightError> {
        queries::alerts::mark_alert_read(self.db()?, id).await
    }

    // --- Durable queues ---

    async fn enqueue(&self, kind: AlertKind, payload: &str) -> Result<i64, ChatsightError> {
        queries::queue::enqueue(self.db()?, &kind.queue_name(), payload).await
    }

    async fn dequeue(&self, kind: AlertKind) -> Result<Option<QueueEntry>, ChatsightError> {
        queries::queue::dequeue(self.db()?, &kind.queue_name(), self.lock_timeout_secs).await
    }

    async fn ack(&self, id: i64) -> Result<(), ChatsightError> {
        queries::queue::ack(self.db()?, id).await
    }

    async fn nack(&self, id: i64, requeue: bool) -> Result<(), ChatsightError> {
        queries::queue::nack(self.db()?, id, requeue).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_store(path: &str) -> SqliteStore {
        let storage = StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        };
        SqliteStore::new(storage, &IngestConfig::default())
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init.db");
        let store = make_store(db_path.to_str().unwrap());

        store.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let store = make_store(db_path.to_str().unwrap());

        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("uninit.db");
        let store = make_store(db_path.to_str().unwrap());

        assert!(store.get_session("s1").await.is_err());
    }

    #[tokio::test]
    async fn full_ingestion_surface_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("surface.db");
        let store = make_store(db_path.to_str().unwrap());
        store.initialize().await.unwrap();

        // Queue round trip per alert kind.
        let id = store
            .enqueue(AlertKind::MessageDeleted, r#"{"eventType":"alert"}"#)
            .await
            .unwrap();
        let entry = store.dequeue(AlertKind::MessageDeleted).await.unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.queue_name, "alerts.message_deleted");
        // Other kinds see nothing.
        assert!(store.dequeue(AlertKind::Disconnected).await.unwrap().is_none());

        // Alert write then ack.
        let alert = NewAlert {
            kind: AlertKind::MessageDeleted,
            session_ref: "ref-1".to_string(),
            session_id: "s1".to_string(),
            chat_id: Some("c1".to_string()),
            message_id: Some("m1".to_string()),
            event_ts: Some(1000),
            body: "Message deleted in chat c1".to_string(),
        };
        store.insert_alert(&alert).await.unwrap();
        store.ack(entry.id).await.unwrap();

        let alerts = store.list_alerts(Some("s1"), false).await.unwrap();
        assert_eq!(alerts.len(), 1);

        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn analysis_surface_through_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("analysis.db");
        let store = make_store(db_path.to_str().unwrap());
        store.initialize().await.unwrap();

        let session = Session {
            id: "s1".to_string(),
            title: None,
            project_id: Some("proj-1".to_string()),
            status: SessionStatus::Ready,
            last_seen_at: None,
            qr_attempts: 0,
            disconnected_at: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        store.upsert_session(&session).await.unwrap();

        let chat = Chat {
            session_id: "s1".to_string(),
            chat_id: "c1".to_string(),
            name: None,
            is_group: false,
            archived: false,
            pinned: false,
            muted: false,
            deleted: false,
            deletion_history: Vec::new(),
            last_message_body: Some("Hello, how can I help?".to_string()),
            last_message_ts: Some(100),
            last_message_from_me: true,
            analysis: None,
            last_analysis_ts: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        store.upsert_chat(&chat).await.unwrap();

        let candidates = store.select_analysis_candidates(30).await.unwrap();
        assert_eq!(candidates.len(), 1);

        store
            .update_chat_analysis("s1", "c1", &serde_json::json!({"intent": "greeting"}), 150)
            .await
            .unwrap();
        let updated = store.get_chat("s1", "c1").await.unwrap().unwrap();
        assert_eq!(updated.last_analysis_ts, Some(150));
        assert_eq!(updated.analysis.unwrap()["intent"], "greeting");

        assert!(store.select_analysis_candidates(30).await.unwrap().is_empty());

        store.close().await.unwrap();
    }
}
