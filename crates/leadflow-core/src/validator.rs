//! Structural and safety validation for outreach drafts.
//!
//! [`RuleValidator`] checks every rule and reports all failures at once, so
//! the repair step can be told exactly what to fix.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{OutreachDraft, ValidationOutcome, ValidationRule};
use crate::scrub::contains_pii;

/// Words accepted at the start of the greeting line.
pub const GREETING_WORDS: &[&str] = &["hi", "hello", "dear", "hey"];

fn placeholder_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\{\{|\}\}|(?i:\[redacted[^\]\n]*\]|\[your [^\]\n]*\]|<name>|<company>|<contact>|lorem ipsum)|\bTODO\b|\bINSERT\b|\bXXX\b",
        )
        .expect("placeholder pattern is a valid regex")
    })
}

/// True if `text` holds a template or redaction artifact.
pub(crate) fn has_placeholder(text: &str) -> bool {
    placeholder_pattern().is_match(text)
}

/// Names the contact and company a draft is addressed to.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub contact_name: &'a str,
    pub company_name: &'a str,
}

/// Checks a draft against structural/safety rules.
pub trait DraftValidator: Send + Sync {
    fn validate(&self, draft: &OutreachDraft, ctx: &ValidationContext<'_>) -> ValidationOutcome;
}

/// Tunable bounds and word lists for [`RuleValidator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Minimum trimmed length in characters.
    pub min_chars: usize,
    /// Maximum trimmed length in characters.
    pub max_chars: usize,
    /// Case-insensitive substrings that must never appear.
    pub banned_terms: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_chars: 60,
            max_chars: 1200,
            banned_terms: vec![
                "guarantee".to_string(),
                "guaranteed".to_string(),
                "risk-free".to_string(),
                "act now".to_string(),
                "100%".to_string(),
            ],
        }
    }
}

/// Default rule-based validator.
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    config: ValidatorConfig,
}

impl RuleValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Content-safety rules only (PII, placeholders, banned terms).
    ///
    /// Used to screen caller-supplied names before they are rendered into
    /// any draft, including the fallback message.
    pub fn screen_field(&self, text: &str) -> BTreeSet<ValidationRule> {
        let mut reasons = BTreeSet::new();
        if contains_pii(text) {
            reasons.insert(ValidationRule::PiiLeak);
        }
        if has_placeholder(text) {
            reasons.insert(ValidationRule::PlaceholderArtifact);
        }
        if self.contains_banned_term(text) {
            reasons.insert(ValidationRule::BannedTerm);
        }
        reasons
    }

    fn contains_banned_term(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.config
            .banned_terms
            .iter()
            .filter(|term| !term.trim().is_empty())
            .any(|term| lower.contains(&term.to_lowercase()))
    }
}

/// The first word of the contact name, lowercased.
fn first_name(contact_name: &str) -> String {
    contact_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn has_greeting(text: &str, contact_name: &str) -> bool {
    let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return false;
    };
    let line = line.to_lowercase();
    let opener = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .unwrap_or_default();
    let name = first_name(contact_name);

    GREETING_WORDS.contains(&opener) && !name.is_empty() && line.contains(&name)
}

impl DraftValidator for RuleValidator {
    fn validate(&self, draft: &OutreachDraft, ctx: &ValidationContext<'_>) -> ValidationOutcome {
        let text = draft.text.trim();
        let mut reasons = BTreeSet::new();

        if text.is_empty() {
            reasons.insert(ValidationRule::EmptyBody);
        }
        if !has_greeting(text, ctx.contact_name) {
            reasons.insert(ValidationRule::MissingGreeting);
        }
        let company = ctx.company_name.trim().to_lowercase();
        if company.is_empty() || !text.to_lowercase().contains(&company) {
            reasons.insert(ValidationRule::MissingCompany);
        }
        reasons.extend(self.screen_field(text));

        let len = text.chars().count();
        if len < self.config.min_chars {
            reasons.insert(ValidationRule::TooShort);
        }
        if len > self.config.max_chars {
            reasons.insert(ValidationRule::TooLong);
        }

        ValidationOutcome::from_reasons(reasons)
    }
}
