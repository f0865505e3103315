//! Domain-level error taxonomy for Leadflow.

use leadflow_state::StorageError;

use super::stage::PipelineStage;
use crate::research::ResearchError;

/// Errors surfaced by the public pipeline API.
///
/// Transform failures and validation failures never appear here: the first
/// degrade to the deterministic path, the second drive the repair state
/// machine.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("research unavailable for '{company}': {source}")]
    ResearchUnavailable {
        company: String,
        #[source]
        source: ResearchError,
    },

    #[error("session creation failed: {0}")]
    SessionCreation(#[source] StorageError),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// The stage that raised this error.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::InvalidInput { field, .. } if *field == "employee_count" => {
                PipelineStage::Score
            }
            PipelineError::InvalidInput { .. } => PipelineStage::Input,
            PipelineError::MissingField(_) => PipelineStage::Score,
            PipelineError::ResearchUnavailable { .. } => PipelineStage::Research,
            PipelineError::SessionCreation(_) => PipelineStage::Session,
            PipelineError::DigestMismatch { .. }
            | PipelineError::Serialization(_)
            | PipelineError::Io(_) => PipelineStage::Persist,
        }
    }
}

/// Result type for Leadflow domain operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
