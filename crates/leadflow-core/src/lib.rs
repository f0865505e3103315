//! Leadflow Core Library
//!
//! Sales-development pipeline: research a company, score the lead, draft an
//! outreach email and push the draft through validation, a single repair and
//! a guaranteed-safe fallback.
//!
//! ## Layer 1 - Domain and orchestration
//!
//! ## Key Components
//!
//! - `score_lead`: deterministic scoring and tiering
//! - `DraftGenerator`: template drafts, optionally polished by a `TextTransform`
//! - `RuleValidator`: structural and safety rules for drafts
//! - `RepairController`: validate → repair once → validate → fallback
//! - `Pipeline`: sequences the stages, one session per run

pub mod artifact;
pub mod config;
pub mod domain;
pub mod draft;
pub mod metrics;
pub mod obs;
pub mod pipeline;
pub mod repair;
pub mod research;
pub mod retry;
pub mod scorer;
pub mod scrub;
pub mod telemetry;
pub mod transform;
pub mod validator;

pub use artifact::{read_result_artifact, write_result_artifact};
pub use config::{PipelineConfig, MAX_FIELD_CHARS};
pub use domain::{
    DraftSource, IntentSignal, LeadRecord, LeadRequest, OutreachDraft, PipelineError,
    PipelineResult, PipelineStage, Result, ScoreResult, Tier, ValidationOutcome, ValidationRule,
    ValidationStatus,
};
pub use draft::DraftGenerator;
pub use metrics::METRICS;
pub use obs::{StageObserver, TracingObserver};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use repair::{
    fallback_message, OutreachOutcome, RepairController, RepairState, RepairStrategy, RepairTrace,
};
pub use research::{
    EnrichedResearch, Enrichment, EnrichmentData, MockResearch, ResearchError, ResearchProvider,
};
pub use retry::RetryPolicy;
pub use scorer::score_lead;
pub use scrub::{contains_pii, scrub_pii};
pub use transform::{TextTransform, TransformError};
pub use validator::{DraftValidator, RuleValidator, ValidationContext, ValidatorConfig};

pub use leadflow_state::{SessionId, SessionStore};
