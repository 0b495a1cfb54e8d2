// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle operations.

use chatsight_core::{ChatsightError, Session, SessionStatus};
use rusqlite::params;

use crate::database::Database;

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<Session, rusqlite::Error> {
    let status_str: String = row.get(3)?;
    let status = status_str.parse::<SessionStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Session {
        id: row.get(0)?,
        title: row.get(1)?,
        project_id: row.get(2)?,
        status,
        last_seen_at: row.get(4)?,
        qr_attempts: row.get(5)?,
        disconnected_at: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

const SESSION_COLUMNS: &str = "id, title, project_id, status, last_seen_at, qr_attempts,
     disconnected_at, created_at, updated_at";

/// Insert the session, or refresh status/title/last-seen if it exists.
///
/// Sessions are created on first contact and never hard-deleted.
pub async fn upsert_session(db: &Database, session: &Session) -> Result<(), ChatsightError> {
    let session = session.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO sessions (id, title, project_id, status, last_seen_at,
                                       qr_attempts, disconnected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     status = excluded.status,
                     last_seen_at = excluded.last_seen_at,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    session.id,
                    session.title,
                    session.project_id,
                    session.status.to_string(),
                    session.last_seen_at,
                    session.qr_attempts,
                    session.disconnected_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(db: &Database, id: &str) -> Result<Option<Session>, ChatsightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id], row_to_session);
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update a session's lifecycle status. Disconnect-flavored statuses also
/// stamp `disconnected_at`.
pub async fn update_session_status(
    db: &Database,
    id: &str,
    status: SessionStatus,
) -> Result<(), ChatsightError> {
    let id = id.to_string();
    let disconnecting = status == SessionStatus::Disconnected;
    db.connection()
        .call(move |conn| {
            if disconnecting {
                conn.execute(
                    "UPDATE sessions SET status = ?1,
                     disconnected_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?2",
                    params![status.to_string(), id],
                )?;
            } else {
                conn.execute(
                    "UPDATE sessions SET status = ?1,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE id = ?2",
                    params![status.to_string(), id],
                )?;
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Link a session to its external project reference.
pub async fn link_session_project(
    db: &Database,
    id: &str,
    project_id: &str,
) -> Result<(), ChatsightError> {
    let id = id.to_string();
    let project_id = project_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET project_id = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![project_id, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Increment the QR counter, marking the session `qr_generated` while
/// attempts remain and `auth_failure` once `max_attempts` is reached.
/// Returns the new counter value.
pub async fn record_qr_attempt(
    db: &Database,
    id: &str,
    max_attempts: i64,
) -> Result<i64, ChatsightError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let attempts: i64 = conn.query_row(
                "SELECT qr_attempts FROM sessions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            let attempts = attempts + 1;
            let status = if attempts >= max_attempts {
                SessionStatus::AuthFailure
            } else {
                SessionStatus::QrGenerated
            };
            conn.execute(
                "UPDATE sessions SET qr_attempts = ?1, status = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![attempts, status.to_string(), id],
            )?;
            Ok(attempts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
