//! Leadflow-State: session storage for pipeline runs
//!
//! Each pipeline run owns exactly one session. Stages commit their output
//! into named slots of that session so later stages (and callers) can read
//! them back by session ID.
//!
//! ## Layer 0 - Data/Persistence
//!
//! ## Key Components
//!
//! - `SessionStore`: async create/get/put contract
//! - `MemorySessionStore`: in-process backend
//! - `SurrealSessionStore`: SurrealDB backend (`mem://` or remote)
//! - `ContentDigest`: SHA-256 digest for sealing artifacts

mod error;
pub mod fakes;
pub mod storage_traits;
pub mod surreal_store;

pub use error::StorageError;
pub use fakes::MemorySessionStore;
pub use storage_traits::{
    ContentDigest, SessionId, SessionRecord, SessionState, SessionStore, StorageResult,
};
pub use surreal_store::SurrealSessionStore;
