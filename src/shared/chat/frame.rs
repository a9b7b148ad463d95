//! Live-Protocol Frames
//!
//! One frame is one JSON object exchanged over an open chat connection,
//! discriminated by its `type` field. Field names on the wire are camelCase
//! (`messageId`, `recipientId`); every outbound frame carries an epoch-millis
//! `timestamp`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{DeliveryStatus, MessageKind};

/// Current time as epoch milliseconds, the timestamp unit of the protocol
pub fn epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Frames a client may send.
///
/// Unrecognized `type` values parse to `Unknown` so a newer client does not
/// break the session; the handler logs and ignores them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum InboundFrame {
    Message {
        message: String,
        recipient_id: Uuid,
        message_type: MessageKind,
    },
    TypingStart,
    TypingStop,
    MessageRead {
        message_id: Uuid,
    },
    TranslateMessage {
        message_id: Uuid,
        target_language: String,
    },
    Heartbeat,
    #[serde(other)]
    Unknown,
}

/// Frames the server sends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundFrame {
    ConnectionEstablished {
        timestamp: i64,
    },
    /// Ack to the sender: the message is durably stored
    MessageSent {
        message_id: Uuid,
        is_sent: bool,
        message: String,
        message_type: MessageKind,
        at: chrono::DateTime<chrono::Utc>,
        delivery_status: DeliveryStatus,
        timestamp: i64,
    },
    /// Push to the recipient's live connection
    MessageReceived {
        message_id: Uuid,
        is_sent: bool,
        message: String,
        message_type: MessageKind,
        at: chrono::DateTime<chrono::Utc>,
        sender_id: Uuid,
        timestamp: i64,
    },
    /// Advisory to the sender: the recipient's connection took the message
    MessageDelivered {
        message_id: Uuid,
        delivered_to: Uuid,
        timestamp: i64,
    },
    /// Advisory to the sender: the recipient marked the message read
    MessageRead {
        message_id: Uuid,
        read_by: Uuid,
        timestamp: i64,
    },
    UserOnline {
        user_id: Uuid,
        timestamp: i64,
    },
    UserOffline {
        user_id: Uuid,
        timestamp: i64,
    },
    UserTypingStart {
        user_id: Uuid,
        timestamp: i64,
    },
    UserTypingStop {
        user_id: Uuid,
        timestamp: i64,
    },
    MessageTranslated {
        message_id: Uuid,
        original_text: String,
        translated_text: String,
        target_language: String,
        timestamp: i64,
    },
    HeartbeatAck {
        timestamp: i64,
    },
    Error {
        message: String,
        timestamp: i64,
    },
}

impl OutboundFrame {
    /// Error frame with the current timestamp; the connection stays open
    pub fn error(message: impl Into<String>) -> Self {
        OutboundFrame::Error {
            message: message.into(),
            timestamp: epoch_millis(),
        }
    }

    /// Serialize to the wire representation
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("[Frame] Failed to serialize outbound frame: {:?}", e);
            format!(
                r#"{{"type":"error","message":"internal serialization failure","timestamp":{}}}"#,
                epoch_millis()
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_message_frame() {
        let recipient = Uuid::new_v4();
        let raw = format!(
            r#"{{"type":"message","message":"hi","recipientId":"{recipient}","messageType":"TEXT"}}"#
        );
        let frame: InboundFrame = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Message {
                message: "hi".to_string(),
                recipient_id: recipient,
                message_type: MessageKind::Text,
            }
        );
    }

    #[test]
    fn test_parse_control_frames() {
        assert_eq!(
            serde_json::from_str::<InboundFrame>(r#"{"type":"typing_start"}"#).unwrap(),
            InboundFrame::TypingStart
        );
        assert_eq!(
            serde_json::from_str::<InboundFrame>(r#"{"type":"heartbeat"}"#).unwrap(),
            InboundFrame::Heartbeat
        );
    }

    #[test]
    fn test_parse_translate_frame() {
        let message_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"type":"translate_message","messageId":"{message_id}","targetLanguage":"ur"}}"#
        );
        let frame: InboundFrame = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            frame,
            InboundFrame::TranslateMessage {
                message_id,
                target_language: "ur".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_frame_type_is_tolerated() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"type":"video_call_offer"}"#).unwrap();
        assert_eq!(frame, InboundFrame::Unknown);
    }

    #[test]
    fn test_message_frame_missing_fields_is_rejected() {
        // recipientId absent: a parse error, answered with an error frame
        let result = serde_json::from_str::<InboundFrame>(r#"{"type":"message","message":"hi"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_outbound_frame_wire_shape() {
        let user_id = Uuid::new_v4();
        let json = OutboundFrame::UserTypingStart {
            user_id,
            timestamp: 1700000000000,
        }
        .to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "user_typing_start");
        assert_eq!(value["userId"], user_id.to_string());
        assert_eq!(value["timestamp"], 1700000000000i64);
    }

    #[test]
    fn test_error_frame_has_timestamp() {
        let json = OutboundFrame::error("bad frame").to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "bad frame");
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }
}
