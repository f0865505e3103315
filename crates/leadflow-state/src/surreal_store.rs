//! SurrealDB-backed SessionStore implementation
//!
//! Sessions live in a single `sessions` table keyed by a unique `session_id`
//! index. Rows are converted to/from `storage_traits` types at the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage_traits::{SessionId, SessionRecord, SessionState, SessionStore, StorageResult};

/// Serialize chrono timestamps as native SurrealDB datetimes.
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Row layout of the `sessions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<surrealdb::sql::Thing>,
    session_id: String,
    state: serde_json::Value,
    #[serde(with = "surreal_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "surreal_datetime")]
    updated_at: DateTime<Utc>,
}

impl DbSession {
    fn into_record(self) -> StorageResult<SessionRecord> {
        let state: SessionState = if self.state.is_null() {
            SessionState::new()
        } else {
            serde_json::from_value(self.state)?
        };
        Ok(SessionRecord {
            session_id: SessionId(self.session_id),
            state,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB-backed implementation of [`SessionStore`].
pub struct SurrealSessionStore {
    db: Surreal<Any>,
}

impl SurrealSessionStore {
    /// Create an in-memory instance.
    ///
    /// Connects to `mem://`, selects `leadflow/main`, and defines the schema.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect("mem://").await
    }

    /// Connect to any SurrealDB endpoint (`mem://`, `ws://host:port`, ...).
    pub async fn connect(endpoint: &str) -> StorageResult<Self> {
        let db = surrealdb::engine::any::connect(endpoint)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        db.use_ns("leadflow")
            .use_db("main")
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        init_schema(&db).await?;
        info!(endpoint = %endpoint, "SurrealSessionStore connected");
        Ok(Self { db })
    }

    /// Connect using `LEADFLOW_SURREALDB_URL`, falling back to `mem://`.
    pub async fn from_env() -> StorageResult<Self> {
        let url =
            std::env::var("LEADFLOW_SURREALDB_URL").unwrap_or_else(|_| "mem://".to_string());
        Self::connect(&url).await
    }

    async fn fetch(&self, id: &SessionId) -> StorageResult<DbSession> {
        let sid = id.0.clone();
        let mut res = self
            .db
            .query("SELECT * FROM sessions WHERE session_id = $sid")
            .bind(("sid", sid))
            .await?;

        let rows: Vec<DbSession> = res.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: id.0.clone(),
            })
    }
}

/// Define the `sessions` table. Idempotent.
async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing sessions table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS sessions SCHEMALESS;

        -- One row per session
        DEFINE INDEX IF NOT EXISTS idx_session_id ON TABLE sessions COLUMNS session_id UNIQUE;

        -- Listing is ordered by creation time
        DEFINE INDEX IF NOT EXISTS idx_created_at ON TABLE sessions COLUMNS created_at;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StorageError::Connection(format!("schema setup failed: {e}")))?;
    Ok(())
}

#[async_trait]
impl SessionStore for SurrealSessionStore {
    async fn create(&self) -> StorageResult<SessionId> {
        let session_id = SessionId::new();
        let now = Utc::now();
        let row = DbSession {
            id: None,
            session_id: session_id.0.clone(),
            state: serde_json::Value::Object(Default::default()),
            created_at: now,
            updated_at: now,
        };

        let created: Option<DbSession> = self
            .db
            .create("sessions")
            .content(row)
            .await
            .map_err(|e| StorageError::Allocation(e.to_string()))?;

        if created.is_none() {
            return Err(StorageError::Allocation(format!(
                "backend returned no row for session {session_id}"
            )));
        }

        debug!(session_id = %session_id, "created session");
        Ok(session_id)
    }

    async fn get(&self, id: &SessionId) -> StorageResult<SessionRecord> {
        self.fetch(id).await?.into_record()
    }

    async fn put(&self, id: &SessionId, patch: SessionState) -> StorageResult<SessionRecord> {
        let current = self.fetch(id).await?.into_record()?;
        let mut state = current.state;
        state.merge(patch);

        let state_json = serde_json::to_value(&state)?;
        let now = SurrealDatetime::from(Utc::now());
        let sid = id.0.clone();

        let mut res = self
            .db
            .query("UPDATE sessions SET state = $state, updated_at = $now WHERE session_id = $sid")
            .bind(("state", state_json))
            .bind(("now", now))
            .bind(("sid", sid))
            .await?;

        let rows: Vec<DbSession> = res.take(0)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::SessionNotFound {
                session_id: id.0.clone(),
            })?;

        debug!(session_id = %id, slots = state.len(), "updated session");
        row.into_record()
    }

    async fn delete(&self, id: &SessionId) -> StorageResult<bool> {
        let sid = id.0.clone();
        let mut res = self
            .db
            .query("DELETE FROM sessions WHERE session_id = $sid RETURN BEFORE")
            .bind(("sid", sid))
            .await?;

        let deleted: Vec<DbSession> = res.take(0)?;
        Ok(!deleted.is_empty())
    }

    async fn list(&self) -> StorageResult<Vec<SessionRecord>> {
        let mut res = self
            .db
            .query("SELECT * FROM sessions ORDER BY created_at ASC")
            .await?;

        let rows: Vec<DbSession> = res.take(0)?;
        rows.into_iter().map(DbSession::into_record).collect()
    }
}
