// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end ingestion against the real SQLite store: enqueue, deliver,
//! persist, settle.

use std::sync::Arc;

use chatsight_config::model::{IngestConfig, StorageConfig};
use chatsight_core::{AlertKind, StoreAdapter};
use chatsight_ingest::{AlertConsumer, DeliveryOutcome};
use chatsight_storage::SqliteStore;
use tempfile::tempdir;

async fn open_store(dir: &tempfile::TempDir) -> Arc<SqliteStore> {
    let config = StorageConfig {
        database_path: dir.path().join("ingest.db").to_str().unwrap().to_string(),
        wal_mode: true,
    };
    let store = Arc::new(SqliteStore::new(config, &IngestConfig::default()));
    store.initialize().await.unwrap();
    store
}

fn deleted_payload(session_id: &str, chat_id: &str) -> String {
    serde_json::json!({
        "eventType": "alert",
        "alert": {
            "session": "65a1b2c3d4e5f60718293a4b",
            "sessionId": session_id,
            "type": "message_deleted",
            "messageId": "m1",
            "chatId": chat_id,
            "timestamp": 1700000000000i64
        }
    })
    .to_string()
}

#[tokio::test]
async fn delivered_alert_lands_in_the_log_and_completes_the_entry() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir).await;
    let consumer = AlertConsumer::new(store.clone(), &IngestConfig::default());

    store
        .enqueue(AlertKind::MessageDeleted, &deleted_payload("s1", "c1"))
        .await
        .unwrap();

    let entry = store.dequeue(AlertKind::MessageDeleted).await.unwrap().unwrap();
    let outcome = consumer.handle_delivery(AlertKind::MessageDeleted, entry).await;
    assert_eq!(outcome, DeliveryOutcome::Recorded);

    let alerts = store.list_alerts(Some("s1"), false).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::MessageDeleted);
    assert_eq!(alerts[0].body, "Message deleted in chat c1");

    // Settled: nothing left to deliver.
    assert!(store.dequeue(AlertKind::MessageDeleted).await.unwrap().is_none());

    store.close().await.unwrap();
}

#[tokio::test]
async fn invalid_payload_is_dropped_and_never_redelivered() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir).await;
    let consumer = AlertConsumer::new(store.clone(), &IngestConfig::default());

    let payload = serde_json::json!({
        "eventType": "alert",
        "alert": {
            "session": "ref",
            "sessionId": "s1",
            "type": "message_deleted",
            "chatId": "c1"
        }
    })
    .to_string();
    store.enqueue(AlertKind::MessageDeleted, &payload).await.unwrap();

    let entry = store.dequeue(AlertKind::MessageDeleted).await.unwrap().unwrap();
    let outcome = consumer.handle_delivery(AlertKind::MessageDeleted, entry).await;
    assert_eq!(outcome, DeliveryOutcome::Dropped);

    assert!(store.list_alerts(None, false).await.unwrap().is_empty());
    assert!(
        store.dequeue(AlertKind::MessageDeleted).await.unwrap().is_none(),
        "poison message must not loop"
    );

    store.close().await.unwrap();
}

#[tokio::test]
async fn redelivered_duplicate_appends_a_second_alert_row() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir).await;
    let consumer = AlertConsumer::new(store.clone(), &IngestConfig::default());

    // Simulate a crash between insert and ack: the entry is handled once,
    // then nacked back (as redelivery would) and handled again.
    store
        .enqueue(AlertKind::MessageDeleted, &deleted_payload("s1", "c1"))
        .await
        .unwrap();
    let entry = store.dequeue(AlertKind::MessageDeleted).await.unwrap().unwrap();
    consumer
        .handle_delivery(AlertKind::MessageDeleted, entry.clone())
        .await;
    store.nack(entry.id, true).await.unwrap();

    let redelivered = store.dequeue(AlertKind::MessageDeleted).await.unwrap().unwrap();
    assert_eq!(redelivered.id, entry.id);
    consumer
        .handle_delivery(AlertKind::MessageDeleted, redelivered)
        .await;

    // At-least-once: both writes stand, the log does not deduplicate.
    let alerts = store.list_alerts(Some("s1"), false).await.unwrap();
    assert_eq!(alerts.len(), 2);

    store.close().await.unwrap();
}
