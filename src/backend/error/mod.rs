//! Backend Error Module
//!
//! This module defines error types specific to the chat backend.
//! These errors are used in HTTP handlers and can be converted to HTTP responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! # Error Types
//!
//! - `Validation` - malformed or missing request fields
//! - `NotFound` - conversation or message absent
//! - `Conflict` - a mutation that was already applied (double soft-delete)
//! - `Upstream` - a collaborator service failed or is not configured
//! - `Database` - persistence failures
//!
//! # HTTP Response Conversion
//!
//! All backend errors implement `IntoResponse` from Axum, allowing them to be
//! returned directly from handlers. The error is automatically converted to an
//! appropriate HTTP status code and JSON response body.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::ChatError;
