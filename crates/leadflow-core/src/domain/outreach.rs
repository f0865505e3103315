//! Outreach drafts and the verdicts the validator hands back about them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a draft's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSource {
    /// Deterministic template rendering (includes the fallback message).
    Template,
    /// Rewritten by the external text-transform service.
    Polished,
}

/// An outreach email draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachDraft {
    pub text: String,
    pub source: DraftSource,
}

impl OutreachDraft {
    pub fn template(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: DraftSource::Template,
        }
    }

    pub fn polished(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: DraftSource::Polished,
        }
    }
}

/// A single structural or safety rule a draft must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    EmptyBody,
    MissingGreeting,
    MissingCompany,
    PiiLeak,
    PlaceholderArtifact,
    BannedTerm,
    TooShort,
    TooLong,
}

impl ValidationRule {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationRule::EmptyBody => "empty_body",
            ValidationRule::MissingGreeting => "missing_greeting",
            ValidationRule::MissingCompany => "missing_company",
            ValidationRule::PiiLeak => "pii_leak",
            ValidationRule::PlaceholderArtifact => "placeholder_artifact",
            ValidationRule::BannedTerm => "banned_term",
            ValidationRule::TooShort => "too_short",
            ValidationRule::TooLong => "too_long",
        }
    }

    /// Instruction-style description, used when asking for a repair.
    pub fn describe(self) -> &'static str {
        match self {
            ValidationRule::EmptyBody => "the email body must not be empty",
            ValidationRule::MissingGreeting => {
                "the first line must greet the contact by name (e.g. \"Hi <first name>,\")"
            }
            ValidationRule::MissingCompany => "the email must mention the company by name",
            ValidationRule::PiiLeak => {
                "the email must not contain email addresses or phone numbers"
            }
            ValidationRule::PlaceholderArtifact => {
                "the email must not contain placeholders, brackets or redaction markers"
            }
            ValidationRule::BannedTerm => {
                "the email must not make guarantees or use pressure phrases"
            }
            ValidationRule::TooShort => "the email is too short; write at least a few sentences",
            ValidationRule::TooLong => "the email is too long; keep it brief",
        }
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail verdict plus every rule that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub passed: bool,
    pub reasons: BTreeSet<ValidationRule>,
}

impl ValidationOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reasons: BTreeSet::new(),
        }
    }

    /// Build an outcome from the failed rules; passes iff `reasons` is empty.
    pub fn from_reasons(reasons: BTreeSet<ValidationRule>) -> Self {
        Self {
            passed: reasons.is_empty(),
            reasons,
        }
    }

    pub fn reason_names(&self) -> Vec<&'static str> {
        self.reasons.iter().map(|r| r.as_str()).collect()
    }
}

/// Terminal validation status of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// First validation passed.
    Valid,
    /// Repair ran and the second validation passed.
    Repaired,
    /// Both validations failed; the fixed fallback message was used.
    Fallback,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Valid => "valid",
            ValidationStatus::Repaired => "repaired",
            ValidationStatus::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
