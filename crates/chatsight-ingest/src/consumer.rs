// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable-queue alert consumer with manual acknowledgment.
//!
//! One poll loop per alert kind; each delivery is processed to completion
//! before the loop touches the queue again. The ack discipline carries the
//! delivery contract:
//!
//! - persisted alert, then ack -- at-least-once creation (a crash between
//!   insert and ack redelivers and duplicates, which the append-only alert
//!   log accepts);
//! - malformed payload -- ack anyway and warn, the poison-message escape
//!   valve that keeps a bad payload from looping forever;
//! - store failure -- nack with requeue, retrying until the store recovers.

use std::sync::Arc;
use std::time::Duration;

use chatsight_config::model::IngestConfig;
use chatsight_core::{AlertKind, QueueEntry, StoreAdapter};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::envelope::AlertEnvelope;

/// What a single delivery resolved to. Exposed for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Alert persisted and the entry acked.
    Recorded,
    /// Malformed payload acked and dropped.
    Dropped,
    /// Store failure; entry nacked back onto the queue.
    Requeued,
}

/// Consumes the per-kind alert queues and writes the alert log.
pub struct AlertConsumer {
    store: Arc<dyn StoreAdapter>,
    poll_interval: Duration,
}

impl AlertConsumer {
    pub fn new(store: Arc<dyn StoreAdapter>, config: &IngestConfig) -> Self {
        Self {
            store,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Runs one consumer task per alert kind until cancellation.
    ///
    /// Kinds are independent: no ordering is guaranteed or required across
    /// queues, and a failing kind never stalls the others.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut consumers = JoinSet::new();
        for kind in AlertKind::ALL {
            let consumer = self.clone();
            let cancel = cancel.clone();
            consumers.spawn(async move { consumer.consume_queue(kind, cancel).await });
        }
        while consumers.join_next().await.is_some() {}
        info!("alert consumers stopped");
    }

    /// Polls one kind's queue, processing each delivery to completion.
    async fn consume_queue(&self, kind: AlertKind, cancel: CancellationToken) {
        let queue = kind.queue_name();
        info!(queue = queue.as_str(), "alert consumer subscribed");

        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.store.dequeue(kind).await {
                Ok(Some(entry)) => {
                    self.handle_delivery(kind, entry).await;
                }
                Ok(None) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
                Err(e) => {
                    error!(queue = queue.as_str(), error = %e, "dequeue failed");
                    tokio::select! {
                        _ = tokio::time::sleep(self.poll_interval) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
            }
        }
        info!(queue = queue.as_str(), "alert consumer unsubscribed");
    }

    /// Processes one delivered entry and settles it (ack or nack).
    pub async fn handle_delivery(&self, kind: AlertKind, entry: QueueEntry) -> DeliveryOutcome {
        let envelope: AlertEnvelope = match serde_json::from_str(&entry.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    queue = entry.queue_name.as_str(),
                    entry_id = entry.id,
                    error = %e,
                    "unparseable alert payload, dropping"
                );
                self.settle_ack(entry.id).await;
                return DeliveryOutcome::Dropped;
            }
        };

        let event = match envelope.alert.classify() {
            Ok(event) => event,
            Err(missing) => {
                // Ack anyway: requeueing a payload that can never validate
                // would redeliver it forever.
                warn!(
                    queue = entry.queue_name.as_str(),
                    entry_id = entry.id,
                    reason = %missing,
                    "invalid alert payload, dropping"
                );
                self.settle_ack(entry.id).await;
                return DeliveryOutcome::Dropped;
            }
        };

        let alert = event.into_new_alert();
        match self.store.insert_alert(&alert).await {
            Ok(alert_id) => {
                // Ack strictly after the insert: a crash in between means
                // redelivery, never a lost alert.
                self.settle_ack(entry.id).await;
                info!(
                    alert_id,
                    kind = %kind,
                    session_id = alert.session_id.as_str(),
                    "alert recorded"
                );
                DeliveryOutcome::Recorded
            }
            Err(e) => {
                error!(
                    queue = entry.queue_name.as_str(),
                    entry_id = entry.id,
                    error = %e,
                    "alert persistence failed, requeueing"
                );
                if let Err(nack_err) = self.store.nack(entry.id, true).await {
                    error!(entry_id = entry.id, error = %nack_err, "nack failed");
                }
                DeliveryOutcome::Requeued
            }
        }
    }

    async fn settle_ack(&self, entry_id: i64) {
        if let Err(e) = self.store.ack(entry_id).await {
            error!(entry_id, error = %e, "ack failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chatsight_core::{
        Alert, Chat, ChatMessage, ChatsightError, NewAlert, Session, SessionStatus,
    };
    use tokio::sync::Mutex;

    /// In-memory store covering the queue and alert surface the consumer
    /// touches, with a switchable insert failure.
    #[derive(Default)]
    struct RecordingStore {
        queue: Mutex<VecDeque<QueueEntry>>,
        alerts: Mutex<Vec<NewAlert>>,
        acked: Mutex<Vec<i64>>,
        nacked: Mutex<Vec<(i64, bool)>>,
        fail_inserts: AtomicBool,
        next_id: Mutex<i64>,
    }

    impl RecordingStore {
        async fn seed(&self, kind: AlertKind, payload: &str) -> QueueEntry {
            let mut next_id = self.next_id.lock().await;
            *next_id += 1;
            let entry = QueueEntry {
                id: *next_id,
                queue_name: kind.queue_name(),
                payload: payload.to_string(),
                status: "pending".to_string(),
                attempts: 0,
                created_at: String::new(),
                updated_at: String::new(),
                locked_until: None,
            };
            self.queue.lock().await.push_back(entry.clone());
            entry
        }
    }

    #[async_trait]
    impl StoreAdapter for RecordingStore {
        async fn initialize(&self) -> Result<(), ChatsightError> {
            Ok(())
        }
        async fn close(&self) -> Result<(), ChatsightError> {
            Ok(())
        }
        async fn upsert_session(&self, _session: &Session) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn get_session(&self, _id: &str) -> Result<Option<Session>, ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn update_session_status(
            &self,
            _id: &str,
            _status: SessionStatus,
        ) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn link_session_project(
            &self,
            _id: &str,
            _project_id: &str,
        ) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn record_qr_attempt(
            &self,
            _id: &str,
            _max_attempts: i64,
        ) -> Result<i64, ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn upsert_chat(&self, _chat: &Chat) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn get_chat(
            &self,
            _session_id: &str,
            _chat_id: &str,
        ) -> Result<Option<Chat>, ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn select_analysis_candidates(
            &self,
            _limit: i64,
        ) -> Result<Vec<Chat>, ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn update_chat_analysis(
            &self,
            _session_id: &str,
            _chat_id: &str,
            _analysis: &serde_json::Value,
            _analyzed_at: i64,
        ) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn soft_delete_chat(
            &self,
            _session_id: &str,
            _chat_id: &str,
            _deleted_at: i64,
        ) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn insert_message(&self, _message: &ChatMessage) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn recent_messages(
            &self,
            _session_id: &str,
            _chat_id: &str,
            _limit: i64,
        ) -> Result<Vec<ChatMessage>, ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn soft_delete_message(
            &self,
            _session_id: &str,
            _message_id: &str,
            _deleted_by: Option<&str>,
            _deleted_at: i64,
        ) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn record_message_edit(
            &self,
            _session_id: &str,
            _message_id: &str,
            _new_body: &str,
        ) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn insert_alert(&self, alert: &NewAlert) -> Result<i64, ChatsightError> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(ChatsightError::Storage {
                    source: "disk full".into(),
                });
            }
            let mut alerts = self.alerts.lock().await;
            alerts.push(alert.clone());
            Ok(alerts.len() as i64)
        }
        async fn list_alerts(
            &self,
            _session_id: Option<&str>,
            _unread_only: bool,
        ) -> Result<Vec<Alert>, ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn mark_alert_read(&self, _id: i64) -> Result<(), ChatsightError> {
            unimplemented!("not exercised by the consumer")
        }
        async fn enqueue(&self, kind: AlertKind, payload: &str) -> Result<i64, ChatsightError> {
            Ok(self.seed(kind, payload).await.id)
        }
        async fn dequeue(
            &self,
            kind: AlertKind,
        ) -> Result<Option<QueueEntry>, ChatsightError> {
            let mut queue = self.queue.lock().await;
            let pos = queue
                .iter()
                .position(|e| e.queue_name == kind.queue_name());
            Ok(pos.and_then(|p| queue.remove(p)))
        }
        async fn ack(&self, id: i64) -> Result<(), ChatsightError> {
            self.acked.lock().await.push(id);
            Ok(())
        }
        async fn nack(&self, id: i64, requeue: bool) -> Result<(), ChatsightError> {
            self.nacked.lock().await.push((id, requeue));
            Ok(())
        }
    }

    fn valid_deleted_payload() -> String {
        serde_json::json!({
            "eventType": "alert",
            "alert": {
                "session": "65a1b2c3d4e5f60718293a4b",
                "sessionId": "s1",
                "type": "message_deleted",
                "messageId": "m1",
                "chatId": "c1",
                "timestamp": 1700000000000i64
            }
        })
        .to_string()
    }

    fn consumer(store: Arc<RecordingStore>) -> AlertConsumer {
        AlertConsumer::new(store, &IngestConfig::default())
    }

    #[tokio::test]
    async fn valid_payload_creates_one_alert_and_acks_once() {
        let store = Arc::new(RecordingStore::default());
        let entry = store.seed(AlertKind::MessageDeleted, &valid_deleted_payload()).await;

        let outcome = consumer(store.clone())
            .handle_delivery(AlertKind::MessageDeleted, entry.clone())
            .await;

        assert_eq!(outcome, DeliveryOutcome::Recorded);
        let alerts = store.alerts.lock().await;
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::MessageDeleted);
        assert_eq!(alerts[0].session_id, "s1");
        assert_eq!(alerts[0].chat_id.as_deref(), Some("c1"));
        assert_eq!(*store.acked.lock().await, vec![entry.id]);
        assert!(store.nacked.lock().await.is_empty());
    }

    #[tokio::test]
    async fn missing_required_field_drops_with_ack_not_requeue() {
        let store = Arc::new(RecordingStore::default());
        let payload = serde_json::json!({
            "eventType": "alert",
            "alert": {
                "session": "ref",
                "sessionId": "s1",
                "type": "message_edited",
                "chatId": "c1"
            }
        })
        .to_string();
        let entry = store.seed(AlertKind::MessageEdited, &payload).await;

        let outcome = consumer(store.clone())
            .handle_delivery(AlertKind::MessageEdited, entry.clone())
            .await;

        assert_eq!(outcome, DeliveryOutcome::Dropped);
        assert!(store.alerts.lock().await.is_empty(), "no alert row");
        assert_eq!(*store.acked.lock().await, vec![entry.id]);
        assert!(store.nacked.lock().await.is_empty(), "never requeued");
    }

    #[tokio::test]
    async fn unparseable_json_drops_with_ack() {
        let store = Arc::new(RecordingStore::default());
        let entry = store.seed(AlertKind::Disconnected, "{not json").await;

        let outcome = consumer(store.clone())
            .handle_delivery(AlertKind::Disconnected, entry.clone())
            .await;

        assert_eq!(outcome, DeliveryOutcome::Dropped);
        assert!(store.alerts.lock().await.is_empty());
        assert_eq!(*store.acked.lock().await, vec![entry.id]);
    }

    #[tokio::test]
    async fn store_failure_nacks_with_requeue_and_writes_nothing() {
        let store = Arc::new(RecordingStore::default());
        store.fail_inserts.store(true, Ordering::SeqCst);
        let entry = store.seed(AlertKind::MessageDeleted, &valid_deleted_payload()).await;

        let outcome = consumer(store.clone())
            .handle_delivery(AlertKind::MessageDeleted, entry.clone())
            .await;

        assert_eq!(outcome, DeliveryOutcome::Requeued);
        assert!(store.alerts.lock().await.is_empty(), "no alert row");
        assert!(store.acked.lock().await.is_empty(), "not acked");
        assert_eq!(*store.nacked.lock().await, vec![(entry.id, true)]);
    }

    #[tokio::test]
    async fn run_drains_queues_until_cancelled() {
        let store = Arc::new(RecordingStore::default());
        store.seed(AlertKind::MessageDeleted, &valid_deleted_payload()).await;
        store
            .seed(
                AlertKind::Disconnected,
                &serde_json::json!({
                    "eventType": "alert",
                    "alert": {"session": "ref", "sessionId": "s1", "type": "disconnected"}
                })
                .to_string(),
            )
            .await;

        let consumer = Arc::new(AlertConsumer::new(
            store.clone(),
            &IngestConfig {
                poll_interval_ms: 10,
                ..IngestConfig::default()
            },
        ));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(consumer.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        handle.await.unwrap();

        // Both kinds consumed, independently.
        let alerts = store.alerts.lock().await;
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().any(|a| a.kind == AlertKind::MessageDeleted));
        assert!(alerts.iter().any(|a| a.kind == AlertKind::Disconnected));
    }
}
