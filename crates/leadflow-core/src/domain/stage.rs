//! Pipeline stage identifiers, shared by errors and observers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Input,
    Session,
    Research,
    Score,
    Outreach,
    Persist,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Input => "input",
            PipelineStage::Session => "session",
            PipelineStage::Research => "research",
            PipelineStage::Score => "score",
            PipelineStage::Outreach => "outreach",
            PipelineStage::Persist => "persist",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
