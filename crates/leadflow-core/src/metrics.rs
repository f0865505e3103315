//! Global atomic counters for pipeline observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a batch).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lock-free run counters.
pub struct Metrics {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
    repairs_attempted: AtomicU64,
    fallbacks_used: AtomicU64,
    transform_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_completed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            repairs_attempted: AtomicU64::new(0),
            fallbacks_used: AtomicU64::new(0),
            transform_failures: AtomicU64::new(0),
        }
    }

    fn bump(counter: &AtomicU64, name: &'static str) {
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = name, "counter incremented");
    }

    pub fn inc_runs_started(&self) {
        Self::bump(&self.runs_started, "runs_started");
    }

    pub fn inc_runs_completed(&self) {
        Self::bump(&self.runs_completed, "runs_completed");
    }

    pub fn inc_runs_failed(&self) {
        Self::bump(&self.runs_failed, "runs_failed");
    }

    pub fn inc_repairs(&self) {
        Self::bump(&self.repairs_attempted, "repairs_attempted");
    }

    pub fn inc_fallbacks(&self) {
        Self::bump(&self.fallbacks_used, "fallbacks_used");
    }

    pub fn inc_transform_failures(&self) {
        Self::bump(&self.transform_failures, "transform_failures");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            runs_started = self.runs_started(),
            runs_completed = self.runs_completed(),
            runs_failed = self.runs_failed(),
            repairs_attempted = self.repairs_attempted(),
            fallbacks_used = self.fallbacks_used(),
            transform_failures = self.transform_failures(),
        );
    }

    pub fn runs_started(&self) -> u64 {
        self.runs_started.load(Ordering::Relaxed)
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    pub fn runs_failed(&self) -> u64 {
        self.runs_failed.load(Ordering::Relaxed)
    }

    pub fn repairs_attempted(&self) -> u64 {
        self.repairs_attempted.load(Ordering::Relaxed)
    }

    pub fn fallbacks_used(&self) -> u64 {
        self.fallbacks_used.load(Ordering::Relaxed)
    }

    pub fn transform_failures(&self) -> u64 {
        self.transform_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        for counter in [
            &self.runs_started,
            &self.runs_completed,
            &self.runs_failed,
            &self.repairs_attempted,
            &self.fallbacks_used,
            &self.transform_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
