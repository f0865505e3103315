//! Shared fakes for leadflow-core integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use leadflow_core::{
    DraftValidator, IntentSignal, LeadRecord, OutreachDraft, PipelineStage, RuleValidator,
    StageObserver, TextTransform, TransformError, ValidationContext, ValidationOutcome,
    ValidationRule,
};
use leadflow_state::{
    MemorySessionStore, SessionId, SessionRecord, SessionState, SessionStore, StorageError,
    StorageResult,
};

pub fn lead(company: &str, employees: Option<i64>, intent: IntentSignal) -> LeadRecord {
    LeadRecord {
        company_name: company.to_string(),
        industry: "Technology / SaaS".to_string(),
        employee_count: employees,
        stage: "Series B".to_string(),
        intent_signal: intent,
        summary: format!("{company} builds software."),
        website: None,
        funding: None,
    }
}

pub fn acme() -> LeadRecord {
    lead("Acme Corp", Some(500), IntentSignal::High)
}

/// A draft body that passes the default rules for Sarah at Acme Corp.
pub fn good_acme_text() -> String {
    "Hi Sarah,\n\nI noticed Acme Corp is building in the Technology / SaaS space. \
     We help teams like yours automate lead qualification and outreach.\n\nBest,\nSales-ops team"
        .to_string()
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Replays queued replies in order; repeats the last one when exhausted.
pub struct ScriptedTransform {
    replies: Mutex<VecDeque<Result<String, TransformError>>>,
    last: Mutex<Option<Result<String, TransformError>>>,
    pub calls: AtomicU32,
    pub instructions: Mutex<Vec<String>>,
}

impl ScriptedTransform {
    pub fn new(replies: Vec<Result<String, TransformError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
            instructions: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextTransform for ScriptedTransform {
    async fn transform(&self, _text: &str, instructions: &str) -> Result<String, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap()
            .push(instructions.to_string());

        let next = self.replies.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                reply
            }
            None => last
                .clone()
                .unwrap_or(Err(TransformError::Unavailable("no reply scripted".into()))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Never answers within any reasonable timeout.
pub struct StallingTransform {
    pub calls: AtomicU32,
}

impl StallingTransform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl TextTransform for StallingTransform {
    async fn transform(&self, _: &str, _: &str) -> Result<String, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("too late".to_string())
    }

    fn name(&self) -> &str {
        "stalling"
    }
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Default rules, counting every call.
#[derive(Default)]
pub struct CountingValidator {
    inner: RuleValidator,
    pub calls: AtomicU32,
}

impl CountingValidator {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DraftValidator for CountingValidator {
    fn validate(&self, draft: &OutreachDraft, ctx: &ValidationContext<'_>) -> ValidationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.validate(draft, ctx)
    }
}

/// Rejects everything.
#[derive(Default)]
pub struct AlwaysFail {
    pub calls: AtomicU32,
}

impl DraftValidator for AlwaysFail {
    fn validate(&self, _: &OutreachDraft, _: &ValidationContext<'_>) -> ValidationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ValidationOutcome::from_reasons([ValidationRule::BannedTerm].into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Cannot allocate sessions.
pub struct FullStore;

#[async_trait]
impl SessionStore for FullStore {
    async fn create(&self) -> StorageResult<SessionId> {
        Err(StorageError::Allocation("store is full".to_string()))
    }
    async fn get(&self, id: &SessionId) -> StorageResult<SessionRecord> {
        Err(StorageError::SessionNotFound {
            session_id: id.to_string(),
        })
    }
    async fn put(&self, id: &SessionId, _: SessionState) -> StorageResult<SessionRecord> {
        Err(StorageError::SessionNotFound {
            session_id: id.to_string(),
        })
    }
    async fn delete(&self, _: &SessionId) -> StorageResult<bool> {
        Ok(false)
    }
    async fn list(&self) -> StorageResult<Vec<SessionRecord>> {
        Ok(Vec::new())
    }
}

/// Creates sessions normally but every `put` fails.
#[derive(Default)]
pub struct ReadOnlyStore {
    inner: MemorySessionStore,
    pub failed_puts: AtomicU32,
}

#[async_trait]
impl SessionStore for ReadOnlyStore {
    async fn create(&self) -> StorageResult<SessionId> {
        self.inner.create().await
    }
    async fn get(&self, id: &SessionId) -> StorageResult<SessionRecord> {
        self.inner.get(id).await
    }
    async fn put(&self, _: &SessionId, _: SessionState) -> StorageResult<SessionRecord> {
        self.failed_puts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Backend("read-only".to_string()))
    }
    async fn delete(&self, id: &SessionId) -> StorageResult<bool> {
        self.inner.delete(id).await
    }
    async fn list(&self) -> StorageResult<Vec<SessionRecord>> {
        self.inner.list().await
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Records `(stage, succeeded)` for every finished stage.
#[derive(Default)]
pub struct RecordingObserver {
    pub started: Mutex<Vec<PipelineStage>>,
    pub finished: Mutex<Vec<(PipelineStage, bool)>>,
}

impl StageObserver for RecordingObserver {
    fn before_stage(&self, _: Option<&SessionId>, stage: PipelineStage) {
        self.started.lock().unwrap().push(stage);
    }

    fn after_stage(
        &self,
        _: Option<&SessionId>,
        stage: PipelineStage,
        succeeded: bool,
        _: Duration,
    ) {
        self.finished.lock().unwrap().push((stage, succeeded));
    }
}
