//! Backend Module
//!
//! Server-side code for the chat service:
//!
//! - **`server`** - configuration, state, initialization
//! - **`routes`** - HTTP route table
//! - **`error`** - error types and HTTP conversion
//! - **`chat`** - conversation store, REST handlers, participant directory
//! - **`realtime`** - presence registry and WebSocket sessions
//! - **`notify`** - push-notification dispatch for offline recipients
//! - **`translate`** - translation collaborator client

/// Server setup (config, state, init)
pub mod server;

/// Route configuration
pub mod routes;

/// Error types
pub mod error;

/// Conversation store and REST surface
pub mod chat;

/// Presence and live sessions
pub mod realtime;

/// Push-notification dispatch
pub mod notify;

/// Message translation
pub mod translate;
