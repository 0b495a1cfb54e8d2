// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue operations with at-least-once delivery.
//!
//! A dequeued entry moves to `processing` under a lock deadline; it leaves
//! that state only through `ack` (completed), `nack` (back to pending, or
//! dropped), or lock expiry, which makes it deliverable again. A consumer
//! crash therefore yields redelivery, never loss.

use chatsight_core::{ChatsightError, QueueEntry};
use rusqlite::params;

use crate::database::Database;

const QUEUE_COLUMNS: &str = "id, queue_name, payload, status, attempts, created_at, updated_at,
     locked_until";

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<QueueEntry, rusqlite::Error> {
    Ok(QueueEntry {
        id: row.get(0)?,
        queue_name: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        locked_until: row.get(7)?,
    })
}

/// Enqueue a new item. Returns the auto-generated queue entry ID.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: &str,
) -> Result<i64, ChatsightError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO queue (queue_name, payload) VALUES (?1, ?2)",
                params![queue_name, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deliver the next entry from the named queue.
///
/// Atomically selects the oldest deliverable entry -- pending, or processing
/// with an expired lock -- and marks it `processing` with a fresh lock of
/// `lock_secs` seconds. Returns `None` if nothing is deliverable.
pub async fn dequeue(
    db: &Database,
    queue_name: &str,
    lock_secs: u64,
) -> Result<Option<QueueEntry>, ChatsightError> {
    let queue_name = queue_name.to_string();
    let lock_modifier = format!("+{lock_secs} seconds");
    db.connection()
        .call(move |conn| {
            // Transaction so find + lock is atomic against other consumers.
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {QUEUE_COLUMNS} FROM queue
                     WHERE queue_name = ?1
                       AND (status = 'pending'
                            OR (status = 'processing'
                                AND locked_until < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))
                     ORDER BY id ASC
                     LIMIT 1"
                ))?;
                stmt.query_row(params![queue_name], row_to_entry)
            };

            match result {
                Ok(entry) => {
                    tx.execute(
                        "UPDATE queue SET status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?2",
                        params![lock_modifier, entry.id],
                    )?;
                    tx.commit()?;

                    Ok(Some(QueueEntry {
                        status: "processing".to_string(),
                        ..entry
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Acknowledge successful processing. The entry is marked `completed` and
/// never redelivered.
pub async fn ack(db: &Database, id: i64) -> Result<(), ChatsightError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Negative acknowledgment.
///
/// With `requeue`, the entry returns to `pending` with its attempt counter
/// incremented -- there is no attempt cap, so a failing downstream retries
/// until it recovers. Without `requeue`, the entry is marked `dropped` and
/// never delivered again.
pub async fn nack(db: &Database, id: i64, requeue: bool) -> Result<(), ChatsightError> {
    db.connection()
        .call(move |conn| {
            if requeue {
                conn.execute(
                    "UPDATE queue SET status = 'pending', attempts = attempts + 1,
                     locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![id],
                )?;
            } else {
                conn.execute(
                    "UPDATE queue SET status = 'dropped', attempts = attempts + 1,
                     locked_until = NULL,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?1",
                    params![id],
                )?;
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
