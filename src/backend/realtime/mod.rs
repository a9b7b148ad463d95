//! Real-time Chat Module
//!
//! This module contains the live side of the chat service:
//!
//! - **`presence`** - process-local registry of who is connected to which
//!   conversation, their typing state and last-seen timestamp
//! - **`session`** - per-connection WebSocket protocol handler
//!
//! # Delivery
//!
//! An outgoing message is routed at the presence registry: a recipient with
//! a live connection gets it pushed over their socket and marked delivered;
//! anyone else is reached through the push-notification service
//! (`backend::notify`), fire-and-forget.

/// Presence registry (connections, typing, last seen)
pub mod presence;

/// WebSocket session protocol handler
pub mod session;

// Re-export commonly used types
pub use presence::{PresenceRegistry, PresenceSnapshot};
pub use session::handle_chat_upgrade;
