// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat operations: upsert with denormalized last-message fields, analysis
//! candidate selection, analysis persistence, and soft delete.

use chatsight_core::{Chat, ChatsightError};
use rusqlite::params;

use crate::database::Database;

const CHAT_COLUMNS: &str = "session_id, chat_id, name, is_group, archived, pinned, muted,
     deleted, deletion_history, last_message_body, last_message_ts,
     last_message_from_me, analysis, last_analysis_ts, created_at, updated_at";

fn row_to_chat(row: &rusqlite::Row<'_>) -> Result<Chat, rusqlite::Error> {
    let deletion_history: String = row.get(8)?;
    let deletion_history = serde_json::from_str(&deletion_history).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let analysis: Option<String> = row.get(12)?;
    let analysis = match analysis {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                12,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?),
        None => None,
    };
    Ok(Chat {
        session_id: row.get(0)?,
        chat_id: row.get(1)?,
        name: row.get(2)?,
        is_group: row.get(3)?,
        archived: row.get(4)?,
        pinned: row.get(5)?,
        muted: row.get(6)?,
        deleted: row.get(7)?,
        deletion_history,
        last_message_body: row.get(9)?,
        last_message_ts: row.get(10)?,
        last_message_from_me: row.get(11)?,
        analysis,
        last_analysis_ts: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Insert the chat, or refresh its flags and denormalized last-message
/// fields if it exists. The analysis columns are never touched here.
pub async fn upsert_chat(db: &Database, chat: &Chat) -> Result<(), ChatsightError> {
    let chat = chat.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO chats (session_id, chat_id, name, is_group, archived, pinned,
                                    muted, last_message_body, last_message_ts,
                                    last_message_from_me)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(session_id, chat_id) DO UPDATE SET
                     name = excluded.name,
                     is_group = excluded.is_group,
                     archived = excluded.archived,
                     pinned = excluded.pinned,
                     muted = excluded.muted,
                     last_message_body = excluded.last_message_body,
                     last_message_ts = excluded.last_message_ts,
                     last_message_from_me = excluded.last_message_from_me,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    chat.session_id,
                    chat.chat_id,
                    chat.name,
                    chat.is_group,
                    chat.archived,
                    chat.pinned,
                    chat.muted,
                    chat.last_message_body,
                    chat.last_message_ts,
                    chat.last_message_from_me,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a chat by its composite key.
pub async fn get_chat(
    db: &Database,
    session_id: &str,
    chat_id: &str,
) -> Result<Option<Chat>, ChatsightError> {
    let session_id = session_id.to_string();
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHAT_COLUMNS} FROM chats WHERE session_id = ?1 AND chat_id = ?2"
            ))?;
            let result = stmt.query_row(params![session_id, chat_id], row_to_chat);
            match result {
                Ok(chat) => Ok(Some(chat)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Chats due for analysis.
///
/// Selected exactly when the last message is non-empty and
/// `last_analysis_ts` is null or strictly older than `last_message_ts`.
/// Ordered newest last-message first and capped at `limit`, which bounds
/// worst-case load per scheduling pass.
pub async fn select_analysis_candidates(
    db: &Database,
    limit: i64,
) -> Result<Vec<Chat>, ChatsightError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHAT_COLUMNS} FROM chats
                 WHERE deleted = 0
                   AND last_message_body IS NOT NULL
                   AND last_message_body <> ''
                   AND (last_analysis_ts IS NULL OR last_analysis_ts < last_message_ts)
                 ORDER BY last_message_ts DESC
                 LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_chat)?;
            let mut chats = Vec::new();
            for row in rows {
                chats.push(row?);
            }
            Ok(chats)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Persist the analysis result and stamp `last_analysis_ts`.
///
/// Deliberately unconditional: a message arriving mid-analysis advances
/// `last_message_ts` past the stamp and re-queues the chat next pass.
pub async fn update_chat_analysis(
    db: &Database,
    session_id: &str,
    chat_id: &str,
    analysis: &serde_json::Value,
    analyzed_at: i64,
) -> Result<(), ChatsightError> {
    let session_id = session_id.to_string();
    let chat_id = chat_id.to_string();
    let analysis = analysis.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE chats SET analysis = ?1, last_analysis_ts = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE session_id = ?3 AND chat_id = ?4",
                params![analysis, analyzed_at, session_id, chat_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Soft-delete the chat and append the timestamp to its deletion history.
pub async fn soft_delete_chat(
    db: &Database,
    session_id: &str,
    chat_id: &str,
    deleted_at: i64,
) -> Result<(), ChatsightError> {
    let session_id = session_id.to_string();
    let chat_id = chat_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE chats SET deleted = 1,
                 deletion_history = json_insert(deletion_history, '$[#]', ?1),
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE session_id = ?2 AND chat_id = ?3",
                params![deleted_at, session_id, chat_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
