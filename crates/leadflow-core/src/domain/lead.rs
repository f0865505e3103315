//! Research output: the firmographic record a lead is scored and drafted from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Categorical buying-intent strength reported by research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSignal {
    Low,
    Medium,
    High,
}

impl IntentSignal {
    /// Fixed numeric weight fed into the scoring formula.
    pub fn weight(self) -> u32 {
        match self {
            IntentSignal::Low => 1,
            IntentSignal::Medium => 3,
            IntentSignal::High => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntentSignal::Low => "low",
            IntentSignal::Medium => "medium",
            IntentSignal::High => "high",
        }
    }
}

impl fmt::Display for IntentSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unrecognised intent label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent signal: {0} (expected low, medium or high)")]
pub struct UnknownIntentSignal(pub String);

impl FromStr for IntentSignal {
    type Err = UnknownIntentSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(IntentSignal::Low),
            "medium" | "med" => Ok(IntentSignal::Medium),
            "high" => Ok(IntentSignal::High),
            _ => Err(UnknownIntentSignal(s.to_string())),
        }
    }
}

/// Firmographic record produced by the research stage.
///
/// Read-only once research has committed it to the session.
/// `employee_count` is optional because adapters may not know it; the
/// pipeline rejects a missing count instead of defaulting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub company_name: String,
    pub industry: String,
    pub employee_count: Option<i64>,
    pub stage: String,
    pub intent_signal: IntentSignal,
    /// One-line description, PII-scrubbed before it leaves research.
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding: Option<String>,
}

impl LeadRecord {
    /// Multi-line, human-readable lead summary.
    pub fn summary_text(&self) -> String {
        let employees = self
            .employee_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!(
            "Company: {}\nIndustry: {}\nStage: {}\nEmployees: {}\nIntent: {}\nSummary: {}",
            self.company_name,
            self.industry,
            self.stage,
            employees,
            self.intent_signal,
            self.summary
        )
    }
}
