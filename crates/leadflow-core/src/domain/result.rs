//! Terminal artifact of a pipeline run.

use leadflow_state::SessionId;
use serde::{Deserialize, Serialize};

use super::lead::LeadRecord;
use super::outreach::{OutreachDraft, ValidationStatus};
use super::score::ScoreResult;
use crate::repair::RepairTrace;

/// One (company, contact) pair to run through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRequest {
    pub company_name: String,
    pub contact_name: String,
}

impl LeadRequest {
    pub fn new(company_name: impl Into<String>, contact_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            contact_name: contact_name.into(),
        }
    }
}

/// The externally visible result of a completed run. Immutable once returned.
///
/// `validation_status` always says whether `outreach` is the first draft,
/// a repaired draft, or the fallback message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub session_id: SessionId,
    pub research: LeadRecord,
    pub score: ScoreResult,
    pub score_explanation: String,
    pub outreach: OutreachDraft,
    pub validation_status: ValidationStatus,
    pub repair: RepairTrace,
}
