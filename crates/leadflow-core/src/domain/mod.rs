//! Domain models for Leadflow.
//!
//! Canonical definitions for the entities that flow through a run:
//! - `LeadRecord`: research output
//! - `ScoreResult`: deterministic score and tier
//! - `OutreachDraft` / `ValidationOutcome`: drafting and validation
//! - `PipelineResult`: the terminal artifact

pub mod error;
pub mod lead;
pub mod outreach;
pub mod result;
pub mod score;
pub mod stage;

pub use error::{PipelineError, Result};
pub use lead::{IntentSignal, LeadRecord, UnknownIntentSignal};
pub use outreach::{DraftSource, OutreachDraft, ValidationOutcome, ValidationRule, ValidationStatus};
pub use result::{LeadRequest, PipelineResult};
pub use score::{ScoreResult, Tier, TIER_A_THRESHOLD, TIER_B_THRESHOLD};
pub use stage::PipelineStage;
