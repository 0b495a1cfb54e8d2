// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert log operations.
//!
//! The alerts table is an append-only log: rows are immutable once written
//! except for read-state, and duplicates from at-least-once redelivery are
//! accepted rather than deduplicated.

use chatsight_core::{Alert, AlertKind, ChatsightError, NewAlert};
use rusqlite::params;

use crate::database::Database;

const ALERT_COLUMNS: &str = "id, kind, session_ref, session_id, chat_id, message_id, event_ts,
     body, is_read, read_at, created_at";

fn row_to_alert(row: &rusqlite::Row<'_>) -> Result<Alert, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let kind = kind_str.parse::<AlertKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Alert {
        id: row.get(0)?,
        kind,
        session_ref: row.get(2)?,
        session_id: row.get(3)?,
        chat_id: row.get(4)?,
        message_id: row.get(5)?,
        event_ts: row.get(6)?,
        body: row.get(7)?,
        is_read: row.get(8)?,
        read_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Append one alert row. Returns the auto-generated alert ID.
pub async fn insert_alert(db: &Database, alert: &NewAlert) -> Result<i64, ChatsightError> {
    let alert = alert.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO alerts (kind, session_ref, session_id, chat_id, message_id,
                                     event_ts, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    alert.kind.to_string(),
                    alert.session_ref,
                    alert.session_id,
                    alert.chat_id,
                    alert.message_id,
                    alert.event_ts,
                    alert.body,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List alerts, newest first, optionally scoped to a session and/or
/// restricted to unread.
pub async fn list_alerts(
    db: &Database,
    session_id: Option<&str>,
    unread_only: bool,
) -> Result<Vec<Alert>, ChatsightError> {
    let session_id = session_id.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let read_filter = if unread_only { " AND is_read = 0" } else { "" };
            let mut alerts = Vec::new();
            match &session_id {
                Some(sid) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {ALERT_COLUMNS} FROM alerts
                         WHERE session_id = ?1{read_filter} ORDER BY id DESC"
                    ))?;
                    let rows = stmt.query_map(params![sid], row_to_alert)?;
                    for row in rows {
                        alerts.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {ALERT_COLUMNS} FROM alerts
                         WHERE 1 = 1{read_filter} ORDER BY id DESC"
                    ))?;
                    let rows = stmt.query_map([], row_to_alert)?;
                    for row in rows {
                        alerts.push(row?);
                    }
                }
            }
            Ok(alerts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark an alert read, stamping `read_at`.
pub async fn mark_alert_read(db: &Database, id: i64) -> Result<(), ChatsightError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE alerts SET is_read = 1,
                 read_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
