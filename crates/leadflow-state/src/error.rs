//! Error types for leadflow-state

use thiserror::Error;

/// Errors raised by [`crate::SessionStore`] implementations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No session exists under the given ID
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// The backend refused to allocate a new session
    #[error("session allocation failed: {0}")]
    Allocation(String),

    /// Digest string is not 64 lowercase hex characters
    #[error("invalid digest: {digest}")]
    InvalidDigest { digest: String },

    /// Database connection error
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Query or driver error from the backend
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Session state could not be (de)serialized
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
