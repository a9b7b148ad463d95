//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the REST surface and the live WebSocket protocol. All types are designed
//! for serialization and transmission over HTTP.

/// Chat types: conversations, messages, live-protocol frames
pub mod chat;

/// Re-export commonly used types for convenience
pub use chat::{
    Cause, ChatMessage, Conversation, DeliveryStatus, InboundFrame, MessageKind, OutboundFrame,
};
