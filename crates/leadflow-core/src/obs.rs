//! Structured observability hooks for pipeline runs.
//!
//! This module provides:
//! - Session-scoped tracing spans via [`session_span`]
//! - Emission functions for lifecycle events (run start/finish, stage
//!   timing, validation verdicts, repair and fallback)
//! - The `StageObserver` extension point called around each stage
//!
//! Events are emitted at `info!` level unless noted. Filter with `RUST_LOG`.

use std::time::Duration;

use leadflow_state::SessionId;
use tracing::{info, warn};

use crate::domain::{PipelineStage, ValidationOutcome, ValidationStatus};

/// Session-scoped span. Attach it with [`tracing::Instrument::instrument`]
/// so every event inside the run carries the session id.
pub fn session_span(session_id: &SessionId) -> tracing::Span {
    tracing::info_span!("leadflow.session", session_id = %session_id)
}

/// Emit event: run started for a company/contact pair.
pub fn emit_run_started(company: &str, contact: &str) {
    info!(event = "run.started", company = %company, contact = %contact);
}

/// Emit event: run finished, successfully or not.
pub fn emit_run_finished(
    session_id: Option<&SessionId>,
    duration_ms: u64,
    status: Option<ValidationStatus>,
    success: bool,
) {
    info!(
        event = "run.finished",
        session_id = session_id.map(SessionId::as_str).unwrap_or("-"),
        duration_ms = duration_ms,
        status = status.map(ValidationStatus::as_str).unwrap_or("-"),
        success = success,
    );
}

/// Emit event: a stage completed.
pub fn emit_stage_finished(
    session_id: Option<&SessionId>,
    stage: PipelineStage,
    succeeded: bool,
    elapsed: Duration,
) {
    info!(
        event = "stage.finished",
        session_id = session_id.map(SessionId::as_str).unwrap_or("-"),
        stage = %stage,
        succeeded = succeeded,
        elapsed_ms = elapsed.as_millis() as u64,
    );
}

/// Emit event: a draft was validated.
pub fn emit_validation(attempt: u32, outcome: &ValidationOutcome) {
    info!(
        event = "draft.validated",
        attempt = attempt,
        passed = outcome.passed,
        reasons = ?outcome.reason_names(),
    );
}

/// Emit event: the one repair attempt is starting.
pub fn emit_repair(strategy: &str, outcome: &ValidationOutcome) {
    info!(
        event = "draft.repair",
        strategy = strategy,
        reasons = ?outcome.reason_names(),
    );
}

/// Emit event: both validations failed, fallback used (warning level).
pub fn emit_fallback(outcome: &ValidationOutcome) {
    warn!(event = "draft.fallback", reasons = ?outcome.reason_names());
}

/// Emit event: the text transform failed and the deterministic path was used
/// (warning level).
pub fn emit_transform_degraded(purpose: &str, error: &dyn std::fmt::Display) {
    warn!(event = "transform.degraded", purpose = purpose, error = %error);
}

/// Emit event: a stage output could not be persisted (warning level).
pub fn emit_persist_failed(session_id: &SessionId, slot: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "session.persist_failed",
        session_id = %session_id,
        slot = slot,
        error = %error,
    );
}

/// Hooks called around every pipeline stage.
///
/// Both methods default to no-ops. `session_id` is `None` for stages that
/// run before the session exists.
pub trait StageObserver: Send + Sync {
    fn before_stage(&self, _session_id: Option<&SessionId>, _stage: PipelineStage) {}

    fn after_stage(
        &self,
        _session_id: Option<&SessionId>,
        _stage: PipelineStage,
        _succeeded: bool,
        _elapsed: Duration,
    ) {
    }
}

/// Default observer: structured `tracing` events per stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StageObserver for TracingObserver {
    fn before_stage(&self, session_id: Option<&SessionId>, stage: PipelineStage) {
        tracing::debug!(
            event = "stage.started",
            session_id = session_id.map(SessionId::as_str).unwrap_or("-"),
            stage = %stage,
        );
    }

    fn after_stage(
        &self,
        session_id: Option<&SessionId>,
        stage: PipelineStage,
        succeeded: bool,
        elapsed: Duration,
    ) {
        emit_stage_finished(session_id, stage, succeeded, elapsed);
    }
}
