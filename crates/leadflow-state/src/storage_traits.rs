//! Storage trait definitions for Leadflow
//!
//! - `SessionStore`: per-run session state (create/get/put)
//! - `ContentDigest`: SHA-256 digest used to seal persisted artifacts
//!
//! All traits are async and backend-agnostic. An in-memory fake is provided
//! via the `fakes` module.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// ContentDigest
// ---------------------------------------------------------------------------

/// Content digest (SHA-256 hex string).
///
/// The inner field is private so the string is always lowercase hex produced
/// by `from_bytes` or validated via `TryFrom<String>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = StorageError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        if s.len() != 64 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidDigest { digest: s });
        }
        Ok(ContentDigest(s.to_ascii_lowercase()))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Unique identifier for a pipeline session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random SessionId
    pub fn new() -> Self {
        SessionId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named JSON slots holding the committed output of each pipeline stage.
///
/// `put` merges slot-by-slot: a slot present in the patch replaces the stored
/// slot of the same name, other slots are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionState(BTreeMap<String, serde_json::Value>);

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a single-slot patch.
    pub fn with(key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut state = Self::new();
        state.insert(key, value);
        state
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Merge `patch` into this state, replacing slots with the same name.
    pub fn merge(&mut self, patch: SessionState) {
        self.0.extend(patch.0);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Full session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-run session storage.
///
/// Guarantees:
/// - `create` allocates a fresh, unique `SessionId` with empty state.
/// - `put` merges into an existing session and bumps `updated_at`.
/// - Sessions are isolated: writes to one ID never touch another.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocate a new empty session.
    async fn create(&self) -> StorageResult<SessionId>;

    /// Fetch a session. Returns `StorageError::SessionNotFound` if absent.
    async fn get(&self, id: &SessionId) -> StorageResult<SessionRecord>;

    /// Merge `patch` into an existing session, returning the updated record.
    async fn put(&self, id: &SessionId, patch: SessionState) -> StorageResult<SessionRecord>;

    /// Delete a session. Returns `false` if it did not exist.
    async fn delete(&self, id: &SessionId) -> StorageResult<bool>;

    /// List all sessions, oldest first.
    async fn list(&self) -> StorageResult<Vec<SessionRecord>>;
}
