// SPDX-FileCopyrightText: 2026 Chatsight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert envelope parsing and normalization.
//!
//! Queue payloads arrive as loosely-shaped JSON. Classification turns them
//! into one tagged [`AlertEvent`] variant per alert kind, with that kind's
//! required fields non-optional, so downstream code never re-checks shapes
//! at runtime.

use chatsight_core::{AlertKind, NewAlert};
use serde::Deserialize;

/// Wire envelope of one queued alert event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEnvelope {
    pub event_type: String,
    pub alert: AlertPayload,
}

/// The loose alert payload, before per-kind validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    /// Opaque store reference for the session.
    pub session: String,
    /// String identifier of the session.
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Unix millis of the triggering event.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// A validated alert event with its kind's required fields present.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    Disconnected {
        session_ref: String,
        session_id: String,
        message: Option<String>,
    },
    MessageDeleted {
        session_ref: String,
        session_id: String,
        message_id: String,
        chat_id: String,
        timestamp: i64,
        message: Option<String>,
    },
    MessageEdited {
        session_ref: String,
        session_id: String,
        message_id: String,
        chat_id: String,
        timestamp: i64,
        message: Option<String>,
    },
    ChatRemoved {
        session_ref: String,
        session_id: String,
        chat_id: String,
        timestamp: i64,
        message: Option<String>,
    },
}

/// A payload that failed per-kind validation. Such messages are dropped
/// (ack + warn), never requeued.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingFields {
    pub kind: AlertKind,
    pub missing: Vec<&'static str>,
}

impl std::fmt::Display for MissingFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} alert missing required fields: {}",
            self.kind,
            self.missing.join(", ")
        )
    }
}

impl AlertPayload {
    /// Validate the payload against its kind's requirements.
    ///
    /// - `disconnected` needs session + sessionId only (always present
    ///   after deserialization).
    /// - `message_deleted` / `message_edited` need messageId, chatId,
    ///   and timestamp.
    /// - `chat_removed` needs chatId and timestamp.
    pub fn classify(self) -> Result<AlertEvent, MissingFields> {
        let mut missing = Vec::new();
        match self.kind {
            AlertKind::Disconnected => Ok(AlertEvent::Disconnected {
                session_ref: self.session,
                session_id: self.session_id,
                message: self.message,
            }),
            AlertKind::MessageDeleted | AlertKind::MessageEdited => {
                if self.message_id.is_none() {
                    missing.push("messageId");
                }
                if self.chat_id.is_none() {
                    missing.push("chatId");
                }
                if self.timestamp.is_none() {
                    missing.push("timestamp");
                }
                if !missing.is_empty() {
                    return Err(MissingFields {
                        kind: self.kind,
                        missing,
                    });
                }
                let message_id = self.message_id.unwrap();
                let chat_id = self.chat_id.unwrap();
                let timestamp = self.timestamp.unwrap();
                if self.kind == AlertKind::MessageDeleted {
                    Ok(AlertEvent::MessageDeleted {
                        session_ref: self.session,
                        session_id: self.session_id,
                        message_id,
                        chat_id,
                        timestamp,
                        message: self.message,
                    })
                } else {
                    Ok(AlertEvent::MessageEdited {
                        session_ref: self.session,
                        session_id: self.session_id,
                        message_id,
                        chat_id,
                        timestamp,
                        message: self.message,
                    })
                }
            }
            AlertKind::ChatRemoved => {
                if self.chat_id.is_none() {
                    missing.push("chatId");
                }
                if self.timestamp.is_none() {
                    missing.push("timestamp");
                }
                if !missing.is_empty() {
                    return Err(MissingFields {
                        kind: self.kind,
                        missing,
                    });
                }
                Ok(AlertEvent::ChatRemoved {
                    session_ref: self.session,
                    session_id: self.session_id,
                    chat_id: self.chat_id.unwrap(),
                    timestamp: self.timestamp.unwrap(),
                    message: self.message,
                })
            }
        }
    }
}

impl AlertEvent {
    pub fn kind(&self) -> AlertKind {
        match self {
            AlertEvent::Disconnected { .. } => AlertKind::Disconnected,
            AlertEvent::MessageDeleted { .. } => AlertKind::MessageDeleted,
            AlertEvent::MessageEdited { .. } => AlertKind::MessageEdited,
            AlertEvent::ChatRemoved { .. } => AlertKind::ChatRemoved,
        }
    }

    /// Build the alert row, deriving a human-readable body when the
    /// payload did not carry one.
    pub fn into_new_alert(self) -> NewAlert {
        match self {
            AlertEvent::Disconnected {
                session_ref,
                session_id,
                message,
            } => NewAlert {
                kind: AlertKind::Disconnected,
                body: message
                    .unwrap_or_else(|| format!("Session {session_id} disconnected")),
                session_ref,
                session_id,
                chat_id: None,
                message_id: None,
                event_ts: None,
            },
            AlertEvent::MessageDeleted {
                session_ref,
                session_id,
                message_id,
                chat_id,
                timestamp,
                message,
            } => NewAlert {
                kind: AlertKind::MessageDeleted,
                body: message
                    .unwrap_or_else(|| format!("Message deleted in chat {chat_id}")),
                session_ref,
                session_id,
                chat_id: Some(chat_id),
                message_id: Some(message_id),
                event_ts: Some(timestamp),
            },
            AlertEvent::MessageEdited {
                session_ref,
                session_id,
                message_id,
                chat_id,
                timestamp,
                message,
            } => NewAlert {
                kind: AlertKind::MessageEdited,
                body: message
                    .unwrap_or_else(|| format!("Message edited in chat {chat_id}")),
                session_ref,
                session_id,
                chat_id: Some(chat_id),
                message_id: Some(message_id),
                event_ts: Some(timestamp),
            },
            AlertEvent::ChatRemoved {
                session_ref,
                session_id,
                chat_id,
                timestamp,
                message,
            } => NewAlert {
                kind: AlertKind::ChatRemoved,
                body: message.unwrap_or_else(|| format!("Chat {chat_id} removed")),
                session_ref,
                session_id,
                chat_id: Some(chat_id),
                message_id: None,
                event_ts: Some(timestamp),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> AlertEnvelope {
        serde_json::from_str(json).expect("envelope should deserialize")
    }

    #[test]
    fn full_message_deleted_payload_classifies() {
        let env = envelope(
            r#"{
                "eventType": "alert",
                "alert": {
                    "session": "65a1b2c3d4e5f60718293a4b",
                    "sessionId": "s1",
                    "type": "message_deleted",
                    "messageId": "m1",
                    "chatId": "c1",
                    "timestamp": 1700000000000
                }
            }"#,
        );
        let event = env.alert.classify().unwrap();
        assert_eq!(
            event,
            AlertEvent::MessageDeleted {
                session_ref: "65a1b2c3d4e5f60718293a4b".into(),
                session_id: "s1".into(),
                message_id: "m1".into(),
                chat_id: "c1".into(),
                timestamp: 1_700_000_000_000,
                message: None,
            }
        );
    }

    #[test]
    fn message_edited_missing_any_required_field_is_rejected() {
        for omit in ["messageId", "chatId", "timestamp"] {
            let mut alert = serde_json::json!({
                "session": "ref",
                "sessionId": "s1",
                "type": "message_edited",
                "messageId": "m1",
                "chatId": "c1",
                "timestamp": 123
            });
            alert.as_object_mut().unwrap().remove(omit);
            let payload: AlertPayload = serde_json::from_value(alert).unwrap();

            let err = payload.classify().unwrap_err();
            assert_eq!(err.kind, AlertKind::MessageEdited);
            assert_eq!(err.missing, vec![omit], "omitting {omit}");
        }
    }

    #[test]
    fn disconnected_needs_only_session_fields() {
        let env = envelope(
            r#"{
                "eventType": "alert",
                "alert": {
                    "session": "ref",
                    "sessionId": "s1",
                    "type": "disconnected"
                }
            }"#,
        );
        let event = env.alert.classify().unwrap();
        assert_eq!(event.kind(), AlertKind::Disconnected);
    }

    #[test]
    fn chat_removed_requires_chat_id_and_timestamp() {
        let payload: AlertPayload = serde_json::from_value(serde_json::json!({
            "session": "ref",
            "sessionId": "s1",
            "type": "chat_removed"
        }))
        .unwrap();
        let err = payload.classify().unwrap_err();
        assert_eq!(err.missing, vec!["chatId", "timestamp"]);
        assert_eq!(
            err.to_string(),
            "chat_removed alert missing required fields: chatId, timestamp"
        );
    }

    #[test]
    fn derived_body_is_used_when_payload_has_no_message() {
        let event = AlertEvent::MessageDeleted {
            session_ref: "ref".into(),
            session_id: "s1".into(),
            message_id: "m1".into(),
            chat_id: "c1".into(),
            timestamp: 5,
            message: None,
        };
        assert_eq!(event.into_new_alert().body, "Message deleted in chat c1");
    }

    #[test]
    fn payload_message_overrides_derived_body() {
        let event = AlertEvent::Disconnected {
            session_ref: "ref".into(),
            session_id: "s1".into(),
            message: Some("Device battery died".into()),
        };
        let alert = event.into_new_alert();
        assert_eq!(alert.body, "Device battery died");
        assert!(alert.chat_id.is_none());
        assert!(alert.event_ts.is_none());
    }

    #[test]
    fn unknown_alert_type_fails_deserialization() {
        let result: Result<AlertPayload, _> = serde_json::from_value(serde_json::json!({
            "session": "ref",
            "sessionId": "s1",
            "type": "session_exploded"
        }));
        assert!(result.is_err());
    }
}
