//! Chat Message Data Structure
//!
//! Represents a message in a conversation, including its per-recipient
//! delivery bookkeeping.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Text,
    Audio,
    Video,
    Image,
    Document,
}

impl MessageKind {
    /// Convert to string for database storage
    pub fn as_db_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "TEXT",
            MessageKind::Audio => "AUDIO",
            MessageKind::Video => "VIDEO",
            MessageKind::Image => "IMAGE",
            MessageKind::Document => "DOCUMENT",
        }
    }

    /// Parse from string (database)
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "TEXT" => Some(MessageKind::Text),
            "AUDIO" => Some(MessageKind::Audio),
            "VIDEO" => Some(MessageKind::Video),
            "IMAGE" => Some(MessageKind::Image),
            "DOCUMENT" => Some(MessageKind::Document),
            _ => None,
        }
    }
}

/// How far a message has travelled towards its recipient.
///
/// Variant order matters: `Ord` gives `Sent < Delivered < Read`, and the
/// status only ever moves forward through `advance`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    /// Convert to string for database storage
    pub fn as_db_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        }
    }

    /// Parse from string (database)
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(DeliveryStatus::Sent),
            "delivered" => Some(DeliveryStatus::Delivered),
            "read" => Some(DeliveryStatus::Read),
            _ => None,
        }
    }

    /// Most-advanced of the current and observed status; never regresses.
    pub fn advance(self, observed: DeliveryStatus) -> DeliveryStatus {
        self.max(observed)
    }
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// Type of message
    pub kind: MessageKind,
    /// Message content (text, or a payload reference for media kinds)
    pub body: String,
    /// When the message was sent
    pub sent_at: chrono::DateTime<chrono::Utc>,
    /// Most-advanced delivery state observed across recipients
    pub delivery_status: DeliveryStatus,
    /// Users who marked this message read (monotonic set)
    pub read_by: Vec<Uuid>,
    /// Users this message was confirmed delivered to (monotonic set)
    pub delivered_to: Vec<Uuid>,
}

/// One message of a conversation history, annotated for the requesting user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub message_id: Uuid,
    pub is_sent: bool,
    pub message: String,
    pub message_type: MessageKind,
    pub at: chrono::DateTime<chrono::Utc>,
    pub delivery_status: DeliveryStatus,
    pub is_read: bool,
    pub read_by: Vec<Uuid>,
    pub delivered_to: Vec<Uuid>,
}

impl MessageView {
    /// Annotate a stored message from `user_id`'s point of view
    pub fn for_user(message: &ChatMessage, user_id: Uuid) -> Self {
        Self {
            message_id: message.id,
            is_sent: message.sender_id == user_id,
            message: message.body.clone(),
            message_type: message.kind,
            at: message.sent_at,
            delivery_status: message.delivery_status,
            is_read: message.read_by.contains(&user_id),
            read_by: message.read_by.clone(),
            delivered_to: message.delivered_to.clone(),
        }
    }
}

/// Response for fetching a conversation's history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageView>,
}

/// Request to translate a stored message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateMessageRequest {
    pub conversation_id: Uuid,
    pub message_id: Uuid,
    pub target_language: String,
}

/// Response after translating a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateMessageResponse {
    pub message_id: Uuid,
    pub original_text: String,
    pub translated_text: String,
    pub target_language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_is_monotonic() {
        assert_eq!(
            DeliveryStatus::Sent.advance(DeliveryStatus::Delivered),
            DeliveryStatus::Delivered
        );
        assert_eq!(
            DeliveryStatus::Read.advance(DeliveryStatus::Delivered),
            DeliveryStatus::Read
        );
        assert_eq!(
            DeliveryStatus::Delivered.advance(DeliveryStatus::Sent),
            DeliveryStatus::Delivered
        );
    }

    #[test]
    fn test_delivery_status_ordering() {
        assert!(DeliveryStatus::Sent < DeliveryStatus::Delivered);
        assert!(DeliveryStatus::Delivered < DeliveryStatus::Read);
    }

    #[test]
    fn test_message_kind_db_round_trip() {
        for kind in [
            MessageKind::Text,
            MessageKind::Audio,
            MessageKind::Video,
            MessageKind::Image,
            MessageKind::Document,
        ] {
            assert_eq!(MessageKind::from_db_str(kind.as_db_str()), Some(kind));
        }
        assert_eq!(MessageKind::from_db_str("STICKER"), None);
    }

    #[test]
    fn test_message_view_annotation() {
        let sender = Uuid::new_v4();
        let reader = Uuid::new_v4();
        let message = ChatMessage {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender_id: sender,
            kind: MessageKind::Text,
            body: "salaam".to_string(),
            sent_at: chrono::Utc::now(),
            delivery_status: DeliveryStatus::Read,
            read_by: vec![reader],
            delivered_to: vec![reader],
        };

        let as_sender = MessageView::for_user(&message, sender);
        assert!(as_sender.is_sent);
        assert!(!as_sender.is_read);

        let as_reader = MessageView::for_user(&message, reader);
        assert!(!as_reader.is_sent);
        assert!(as_reader.is_read);
    }
}
