//! Error types for NoteVault.

use thiserror::Error;

/// Result type alias using NoteVault's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for NoteVault operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A read from the row store failed; the last good snapshot is kept.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A mutation was attempted without an authenticated identity.
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// A write to the row store failed after an optimistic apply.
    #[error("Mutation error: {0}")]
    Mutation(String),

    /// Another mutation on the same key is still in flight.
    #[error("Busy: {0}")]
    Busy(String),

    /// Requested page lies outside `[1, total_pages]`
    #[error("Page {requested} is out of range (1..={total_pages})")]
    PageOutOfRange { requested: usize, total_pages: usize },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authenticated but not allowed (e.g. deleting someone else's note)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness or state-transition conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Object store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Fetch(_) | Error::Mutation(_) | Error::Request(_) | Error::Storage(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_fetch() {
        let err = Error::Fetch("notes: timeout".to_string());
        assert_eq!(err.to_string(), "Fetch error: notes: timeout");
    }

    #[test]
    fn test_error_display_auth_required() {
        let err = Error::AuthRequired("toggle bookmark".to_string());
        assert_eq!(err.to_string(), "Authentication required: toggle bookmark");
    }

    #[test]
    fn test_error_display_page_out_of_range() {
        let err = Error::PageOutOfRange {
            requested: 4,
            total_pages: 3,
        };
        assert_eq!(err.to_string(), "Page 4 is out of range (1..=3)");
    }

    #[test]
    fn test_error_display_busy() {
        let err = Error::Busy("note a".to_string());
        assert_eq!(err.to_string(), "Busy: note a");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Fetch("x".into()).is_retryable());
        assert!(Error::Mutation("x".into()).is_retryable());
        assert!(!Error::AuthRequired("x".into()).is_retryable());
        assert!(!Error::Busy("x".into()).is_retryable());
        assert!(!Error::InvalidInput("x".into()).is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
