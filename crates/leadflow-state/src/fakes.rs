//! In-memory session store
//!
//! `MemorySessionStore` satisfies the [`SessionStore`] contract without any
//! external dependencies. It is the default backend for single-process runs
//! and the reference implementation for the contract tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::error::StorageError;
use crate::storage_traits::*;

/// In-memory session store backed by a `HashMap<SessionId, SessionRecord>`.
///
/// Sessions are never evicted; long-lived callers own cleanup through
/// [`SessionStore::delete`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> StorageResult<MutexGuard<'_, HashMap<String, SessionRecord>>> {
        self.sessions
            .lock()
            .map_err(|_| StorageError::Backend("session map lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self) -> StorageResult<SessionId> {
        let session_id = SessionId::new();
        let now = Utc::now();
        let record = SessionRecord {
            session_id: session_id.clone(),
            state: SessionState::new(),
            created_at: now,
            updated_at: now,
        };
        self.sessions()?.insert(session_id.0.clone(), record);
        debug!(session_id = %session_id, "created session");
        Ok(session_id)
    }

    async fn get(&self, id: &SessionId) -> StorageResult<SessionRecord> {
        self.sessions()?
            .get(&id.0)
            .cloned()
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: id.0.clone(),
            })
    }

    async fn put(&self, id: &SessionId, patch: SessionState) -> StorageResult<SessionRecord> {
        let mut sessions = self.sessions()?;
        let record = sessions
            .get_mut(&id.0)
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: id.0.clone(),
            })?;
        record.state.merge(patch);
        record.updated_at = Utc::now();
        debug!(session_id = %id, slots = record.state.len(), "updated session");
        Ok(record.clone())
    }

    async fn delete(&self, id: &SessionId) -> StorageResult<bool> {
        Ok(self.sessions()?.remove(&id.0).is_some())
    }

    async fn list(&self) -> StorageResult<Vec<SessionRecord>> {
        let mut records: Vec<SessionRecord> = self.sessions()?.values().cloned().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(records)
    }
}
