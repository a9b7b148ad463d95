/**
 * Backend Error Types
 *
 * This module defines error types specific to the chat backend.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Validation Errors
 *
 * Validation errors occur when processing requests with missing or malformed
 * fields: a missing `x-user-id` header, an invalid cause value, a user
 * opening a conversation with themselves.
 *
 * ## Not-Found / Conflict Errors
 *
 * Not-found errors occur when a conversation or message does not exist;
 * conflicts when a mutation was already applied (soft-deleting a
 * conversation twice).
 *
 * ## Upstream Errors
 *
 * Upstream errors occur when a collaborator service (translation,
 * push-notification dispatch) fails or is not configured. On the
 * fire-and-forget notification path these are logged and dropped, never
 * surfaced to the sender.
 */

use axum::http::StatusCode;
use thiserror::Error;

/// Backend-specific error types
///
/// This enum represents all possible errors that can occur in the chat
/// backend. Each variant maps to an HTTP status through `status_code`.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing or malformed request fields
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message
        message: String,
    },

    /// Conversation or message absent
    #[error("{what} not found")]
    NotFound {
        /// What was being looked up
        what: String,
    },

    /// A mutation that was already applied
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable error message
        message: String,
    },

    /// A collaborator service failed or is not configured
    #[error("Upstream error: {message}")]
    Upstream {
        /// Human-readable error message
        message: String,
    },

    /// Persistence failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a new conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Validation` - 400 Bad Request
    /// - `NotFound` - 404 Not Found
    /// - `Conflict` - 409 Conflict
    /// - `Upstream` - 502 Bad Gateway
    /// - `Database` / `Serialization` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            // Database details stay in the logs, not in responses
            Self::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = ChatError::validation("Missing required fields");
        match error {
            ChatError::Validation { message } => {
                assert_eq!(message, "Missing required fields");
            }
            _ => panic!("Expected Validation"),
        }
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ChatError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ChatError::not_found("Chat").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ChatError::conflict("already deleted").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ChatError::upstream("translation unavailable").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ChatError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_error_message_is_opaque() {
        let error = ChatError::Database(sqlx::Error::RowNotFound);
        assert_eq!(error.message(), "Internal server error");
    }

    #[test]
    fn test_not_found_message() {
        let error = ChatError::not_found("Message");
        assert_eq!(error.message(), "Message not found");
    }
}
