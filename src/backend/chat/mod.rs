//! Chat Backend Module
//!
//! This module contains the persistent side of the chat service:
//!
//! - **`db`** - the conversation store (find-or-create, message log,
//!   read/delivery bookkeeping, soft deletion)
//! - **`directory`** - best-effort counterpart profile resolution
//! - **`handlers`** - the companion REST surface
//!
//! The store is the single source of truth; the live protocol in
//! `backend::realtime` persists through the same operations.

/// Database operations for conversations and messages
pub mod db;

/// Participant profile resolution
pub mod directory;

/// REST handlers
pub mod handlers;
