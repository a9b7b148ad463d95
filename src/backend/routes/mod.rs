//! Routes Module
//!
//! Route configuration for the chat service.

/// Main router creation
pub mod router;

pub use router::create_router;
