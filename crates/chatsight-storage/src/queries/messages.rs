// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations: insert, prompt-window fetch, soft delete, and
//! edition history.

use chatsight_core::{ChatMessage, ChatsightError};
use rusqlite::params;

use crate::database::Database;

const MESSAGE_COLUMNS: &str = "session_id, message_id, chat_id, sender, recipient, author,
     from_me, body, timestamp, deleted, deleted_by, deleted_at, editions, created_at";

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<ChatMessage, rusqlite::Error> {
    let editions: String = row.get(12)?;
    let editions = serde_json::from_str(&editions).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(ChatMessage {
        session_id: row.get(0)?,
        message_id: row.get(1)?,
        chat_id: row.get(2)?,
        sender: row.get(3)?,
        recipient: row.get(4)?,
        author: row.get(5)?,
        from_me: row.get(6)?,
        body: row.get(7)?,
        timestamp: row.get(8)?,
        deleted: row.get(9)?,
        deleted_by: row.get(10)?,
        deleted_at: row.get(11)?,
        editions,
        created_at: row.get(13)?,
    })
}

/// Insert a new message.
pub async fn insert_message(db: &Database, message: &ChatMessage) -> Result<(), ChatsightError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (session_id, message_id, chat_id, sender, recipient,
                                       author, from_me, body, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    message.session_id,
                    message.message_id,
                    message.chat_id,
                    message.sender,
                    message.recipient,
                    message.author,
                    message.from_me,
                    message.body,
                    message.timestamp,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The `limit` most recent non-deleted messages of a chat, newest first.
///
/// Callers reverse to chronological order before prompt formatting; the
/// limit caps prompt size deterministically regardless of chat length.
pub async fn recent_messages(
    db: &Database,
    session_id: &str,
    chat_id: &str,
    limit: i64,
) -> Result<Vec<ChatMessage>, ChatsightError> {
    let session_id = session_id.to_string();
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE session_id = ?1 AND chat_id = ?2 AND deleted = 0
                 ORDER BY timestamp DESC
                 LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![session_id, chat_id, limit], row_to_message)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Soft-delete a message, recording the deletor and timestamp.
///
/// The edition history is untouched: deletions never append to it.
pub async fn soft_delete_message(
    db: &Database,
    session_id: &str,
    message_id: &str,
    deleted_by: Option<&str>,
    deleted_at: i64,
) -> Result<(), ChatsightError> {
    let session_id = session_id.to_string();
    let message_id = message_id.to_string();
    let deleted_by = deleted_by.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET deleted = 1, deleted_by = ?1, deleted_at = ?2
                 WHERE session_id = ?3 AND message_id = ?4",
                params![deleted_by, deleted_at, session_id, message_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append the current body to the edition history (oldest first) and store
/// the new body.
pub async fn record_message_edit(
    db: &Database,
    session_id: &str,
    message_id: &str,
    new_body: &str,
) -> Result<(), ChatsightError> {
    let session_id = session_id.to_string();
    let message_id = message_id.to_string();
    let new_body = new_body.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET
                     editions = CASE
                         WHEN body IS NULL THEN editions
                         ELSE json_insert(editions, '$[#]', body)
                     END,
                     body = ?1
                 WHERE session_id = ?2 AND message_id = ?3",
                params![new_body, session_id, message_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn make_message(message_id: &str, ts: i64, body: &str) -> ChatMessage {
        ChatMessage {
            session_id: "s1".to_string(),
            message_id: message_id.to_string(),
            chat_id: "c1".to_string(),
            sender: Some("+15550001".to_string()),
            recipient: None,
            author: None,
            from_me: false,
            body: Some(body.to_string()),
            timestamp: ts,
            deleted: false,
            deleted_by: None,
            deleted_at: None,
            editions: Vec::new(),
            created_at: String::new(),
        }
    }

    #[tokio::test]
    async fn recent_messages_are_newest_first_and_capped() {
        let (db, _dir) = setup_db().await;
        for i in 0..5 {
            insert_message(&db, &make_message(&format!("m{i}"), 100 + i, "hi"))
                .await
                .unwrap();
        }

        let messages = recent_messages(&db, "s1", "c1", 3).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].timestamp, 104);
        assert_eq!(messages[2].timestamp, 102);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn deleted_messages_are_excluded_from_window() {
        let (db, _dir) = setup_db().await;
        insert_message(&db, &make_message("m1", 100, "keep")).await.unwrap();
        insert_message(&db, &make_message("m2", 101, "drop")).await.unwrap();

        soft_delete_message(&db, "s1", "m2", Some("+15550001"), 102)
            .await
            .unwrap();

        let messages = recent_messages(&db, "s1", "c1", 10).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, "m1");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn soft_delete_records_deletor_and_keeps_editions() {
        let (db, _dir) = setup_db().await;
        insert_message(&db, &make_message("m1", 100, "original")).await.unwrap();
        record_message_edit(&db, "s1", "m1", "edited").await.unwrap();

        soft_delete_message(&db, "s1", "m1", Some("+15550002"), 103)
            .await
            .unwrap();

        let all: Vec<ChatMessage> = db
            .connection()
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = 'm1'"
                ))?;
                let rows = stmt.query_map([], row_to_message)?;
                let mut v = Vec::new();
                for row in rows {
                    v.push(row?);
                }
                Ok::<_, rusqlite::Error>(v)
            })
            .await
            .unwrap();
        let msg = &all[0];
        assert!(msg.deleted);
        assert_eq!(msg.deleted_by.as_deref(), Some("+15550002"));
        assert_eq!(msg.deleted_at, Some(103));
        // Deletion never touches the edition history.
        assert_eq!(msg.editions, vec!["original".to_string()]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn edits_accumulate_oldest_first() {
        let (db, _dir) = setup_db().await;
        insert_message(&db, &make_message("m1", 100, "v1")).await.unwrap();

        record_message_edit(&db, "s1", "m1", "v2").await.unwrap();
        record_message_edit(&db, "s1", "m1", "v3").await.unwrap();

        let messages = recent_messages(&db, "s1", "c1", 1).await.unwrap();
        assert_eq!(messages[0].body.as_deref(), Some("v3"));
        assert_eq!(
            messages[0].editions,
            vec!["v1".to_string(), "v2".to_string()]
        );

        db.close().await.unwrap();
    }
}
