//! Chat Module
//!
//! Data structures shared by the REST surface and the live protocol:
//!
//! - `Conversation` / `Cause` - a two-party thread and its relationship context
//! - `ChatMessage` / `DeliveryStatus` - the message log and its bookkeeping
//! - `InboundFrame` / `OutboundFrame` - the live-connection wire protocol

pub mod conversation;
pub mod frame;
pub mod message;

// Re-export all types
pub use conversation::{
    Cause, Conversation, ConversationSummary, CreateConversationRequest,
    CreateConversationResponse, ListConversationsResponse, ParticipantProfile,
};
pub use frame::{epoch_millis, InboundFrame, OutboundFrame};
pub use message::{
    ChatMessage, DeliveryStatus, ListMessagesResponse, MessageKind, MessageView,
    TranslateMessageRequest, TranslateMessageResponse,
};
