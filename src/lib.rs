//! Sawari Chat - Main Library
//!
//! Real-time chat backend for the Sawari ride/logistics marketplace. Riders
//! and providers (drivers, transporters, rickshaw owners) message each other
//! in two-party conversations scoped by the relationship that opened them;
//! messages persist in PostgreSQL, presence and typing state live in memory
//! per process, and offline recipients are reached through the
//! push-notification service.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared between the REST surface and the live
//!   WebSocket protocol: conversations, messages, frames.
//!
//! - **`backend`** - The server: Axum routes and WebSocket sessions, the
//!   conversation store, the presence registry, and the collaborator clients
//!   (push notifications, translation).
//!
//! # Delivery Semantics
//!
//! A sender always learns definitively whether their message was durably
//! stored (`message_sent` ack or an `error` frame). Delivery and read
//! confirmations are advisory: present when the recipient is connected,
//! absent when they are not, in which case the notification service pages
//! them instead.
//!
//! # Scaling Note
//!
//! The presence registry is process-local. Running several instances keeps
//! every correctness property (the store serializes appends), but presence
//! and typing indicators only see connections of the same process; a shared
//! presence store would be needed for true multi-instance presence.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
