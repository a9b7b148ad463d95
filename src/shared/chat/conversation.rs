//! Conversation Data Structures
//!
//! Represents a two-party conversation scoped by the relationship that
//! caused it (driver booking, transporter enquiry, ...).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relationship context a conversation was opened under.
///
/// Immutable after creation; the participant directory dispatches on it to
/// find the counterpart's display profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cause {
    Driver,
    Transporter,
    Rickshaw,
    ERickshaw,
    IndependentCarOwner,
}

impl Cause {
    /// Convert to string for database storage
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Cause::Driver => "DRIVER",
            Cause::Transporter => "TRANSPORTER",
            Cause::Rickshaw => "RICKSHAW",
            Cause::ERickshaw => "E_RICKSHAW",
            Cause::IndependentCarOwner => "INDEPENDENT_CAR_OWNER",
        }
    }

    /// Parse from string (database)
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "DRIVER" => Some(Cause::Driver),
            "TRANSPORTER" => Some(Cause::Transporter),
            "RICKSHAW" => Some(Cause::Rickshaw),
            "E_RICKSHAW" => Some(Cause::ERickshaw),
            "INDEPENDENT_CAR_OWNER" => Some(Cause::IndependentCarOwner),
            _ => None,
        }
    }
}

/// Represents a conversation between two users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// User who opened the conversation
    pub initiator_id: Uuid,
    /// The other participant
    pub counterpart_id: Uuid,
    /// Relationship context
    pub cause: Cause,
    /// Users who soft-hid this conversation from their own list
    pub deleted_for: Vec<Uuid>,
    /// When the conversation was created
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Bumped on every message append
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Conversation {
    /// Check if user is a participant
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.initiator_id == user_id || self.counterpart_id == user_id
    }

    /// Get the other participant
    pub fn other_participant(&self, current_user_id: Uuid) -> Uuid {
        if self.initiator_id == current_user_id {
            self.counterpart_id
        } else {
            self.initiator_id
        }
    }
}

/// Counterpart display metadata resolved by the participant directory.
///
/// All fields are best-effort; a missing profile yields empty strings, never
/// an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ParticipantProfile {
    pub name: String,
    pub image: String,
    pub number: String,
    /// Profile-record id (driver/vehicle/transporter row), falls back to the
    /// user id when no profile row exists
    pub profile_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// One row of the caller's chat list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub name: String,
    pub image: String,
    pub counterpart_user_id: Option<Uuid>,
    pub counterpart_profile_id: Option<Uuid>,
    /// Last message time, or the conversation's updated_at when empty
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub cause: Cause,
    pub unread_count: u32,
    pub is_online: bool,
    pub last_seen: Option<chrono::DateTime<chrono::Utc>>,
    pub is_typing: bool,
}

/// Request to create (or find) a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub cause: Cause,
    /// Counterpart user id
    pub id: Uuid,
}

/// Response after creating or finding a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    pub conversation_id: Uuid,
    pub name: String,
    pub image: String,
    pub number: String,
    pub counterpart_profile_id: Option<Uuid>,
    pub counterpart_user_id: Option<Uuid>,
}

/// Response for listing conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_db_round_trip() {
        for cause in [
            Cause::Driver,
            Cause::Transporter,
            Cause::Rickshaw,
            Cause::ERickshaw,
            Cause::IndependentCarOwner,
        ] {
            assert_eq!(Cause::from_db_str(cause.as_db_str()), Some(cause));
        }
        assert_eq!(Cause::from_db_str("BICYCLE"), None);
    }

    #[test]
    fn test_cause_wire_format() {
        let json = serde_json::to_string(&Cause::ERickshaw).unwrap();
        assert_eq!(json, "\"E_RICKSHAW\"");
        let parsed: Cause = serde_json::from_str("\"INDEPENDENT_CAR_OWNER\"").unwrap();
        assert_eq!(parsed, Cause::IndependentCarOwner);
    }

    #[test]
    fn test_other_participant() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            initiator_id: a,
            counterpart_id: b,
            cause: Cause::Driver,
            deleted_for: vec![],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(conversation.other_participant(a), b);
        assert_eq!(conversation.other_participant(b), a);
        assert!(conversation.has_participant(a));
        assert!(!conversation.has_participant(Uuid::new_v4()));
    }
}
