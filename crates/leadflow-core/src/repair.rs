//! The draft → validate → repair → revalidate → fallback state machine.
//!
//! A run validates at most twice and repairs at most once. If the repaired
//! draft still fails, the fixed fallback message is used without further
//! validation; input screening and `PipelineConfig::validate` are what make
//! that message safe.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{LeadRecord, OutreachDraft, Tier, ValidationOutcome, ValidationStatus};
use crate::draft::DraftGenerator;
use crate::metrics::METRICS;
use crate::obs::{emit_fallback, emit_repair, emit_transform_degraded, emit_validation};
use crate::scrub::scrub_pii;
use crate::transform::transform_with_timeout;
use crate::validator::{DraftValidator, ValidationContext};

/// Render the fixed fallback message.
pub fn fallback_message(contact_name: &str, company_name: &str) -> String {
    format!(
        "Hi {contact_name},\n\n\
         Checking in regarding {company_name}. Happy to share a short overview of how we \
         help sales teams automate lead qualification and outreach whenever it suits you.\n\n\
         Best,\nSales-ops team"
    )
}

/// Instructions for a transform-based repair, naming every failed rule.
pub fn repair_instructions(
    outcome: &ValidationOutcome,
    contact_name: &str,
    company_name: &str,
) -> String {
    let mut out = format!(
        "Rewrite the outreach email below so it fixes these problems. \
         Open with \"Hi {contact_name},\" and mention {company_name} by name. \
         Do not add any new facts, figures, links, email addresses or phone numbers.\n"
    );
    for rule in &outcome.reasons {
        out.push_str("- ");
        out.push_str(rule.describe());
        out.push('\n');
    }
    out.push_str("Return only the email text.");
    out
}

/// States visited by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairState {
    Draft,
    Validated,
    Repairing,
    Revalidated,
    Fallback,
}

/// How the single repair produced its draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    /// Transform rewrite guided by the failed rules.
    Transform,
    /// Fresh render of the deterministic template.
    Template,
}

impl RepairStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            RepairStrategy::Transform => "transform",
            RepairStrategy::Template => "template",
        }
    }
}

impl fmt::Display for RepairStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record of one controller run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairTrace {
    pub states: Vec<RepairState>,
    /// One entry per validation call, in order (1 or 2 entries).
    pub validations: Vec<ValidationOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<RepairStrategy>,
    /// Set when a transform repair was attempted and failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_error: Option<String>,
    pub status: ValidationStatus,
}

impl RepairTrace {
    fn new() -> Self {
        Self {
            states: vec![RepairState::Draft],
            validations: Vec::new(),
            strategy: None,
            transform_error: None,
            status: ValidationStatus::Valid,
        }
    }
}

/// Final draft plus how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct OutreachOutcome {
    pub draft: OutreachDraft,
    pub trace: RepairTrace,
}

impl OutreachOutcome {
    pub fn status(&self) -> ValidationStatus {
        self.trace.status
    }
}

/// Drives one draft through validation, a single repair and fallback.
#[derive(Clone)]
pub struct RepairController {
    generator: DraftGenerator,
    validator: Arc<dyn DraftValidator>,
}

impl RepairController {
    pub fn new(generator: DraftGenerator, validator: Arc<dyn DraftValidator>) -> Self {
        Self {
            generator,
            validator,
        }
    }

    pub fn generator(&self) -> &DraftGenerator {
        &self.generator
    }

    fn validate(
        &self,
        attempt: u32,
        draft: &OutreachDraft,
        ctx: &ValidationContext<'_>,
        trace: &mut RepairTrace,
    ) -> bool {
        let outcome = self.validator.validate(draft, ctx);
        emit_validation(attempt, &outcome);
        let passed = outcome.passed;
        trace.validations.push(outcome);
        passed
    }

    async fn repair(
        &self,
        lead: &LeadRecord,
        contact_name: &str,
        tier: Tier,
        failed: &ValidationOutcome,
        draft: &OutreachDraft,
        trace: &mut RepairTrace,
    ) -> OutreachDraft {
        if let Some(transform) = self.generator.active_transform() {
            emit_repair(RepairStrategy::Transform.as_str(), failed);
            let instructions = repair_instructions(failed, contact_name, &lead.company_name);
            match transform_with_timeout(
                transform.as_ref(),
                &draft.text,
                &instructions,
                self.generator.timeout(),
            )
            .await
            {
                Ok(text) => {
                    trace.strategy = Some(RepairStrategy::Transform);
                    return OutreachDraft::polished(scrub_pii(&text));
                }
                Err(err) => {
                    METRICS.inc_transform_failures();
                    emit_transform_degraded("repair", &err);
                    trace.transform_error = Some(err.to_string());
                }
            }
        }

        emit_repair(RepairStrategy::Template.as_str(), failed);
        trace.strategy = Some(RepairStrategy::Template);
        OutreachDraft::template(DraftGenerator::render_template(lead, contact_name, tier))
    }

    /// Produce the outreach draft for one lead.
    pub async fn run(&self, lead: &LeadRecord, contact_name: &str, tier: Tier) -> OutreachOutcome {
        let ctx = ValidationContext {
            contact_name,
            company_name: &lead.company_name,
        };
        let mut trace = RepairTrace::new();

        let draft = self.generator.generate(lead, contact_name, tier).await;
        if self.validate(1, &draft, &ctx, &mut trace) {
            trace.states.push(RepairState::Validated);
            trace.status = ValidationStatus::Valid;
            return OutreachOutcome { draft, trace };
        }

        trace.states.push(RepairState::Repairing);
        METRICS.inc_repairs();
        let failed = trace.validations[0].clone();
        let repaired = self
            .repair(lead, contact_name, tier, &failed, &draft, &mut trace)
            .await;

        if self.validate(2, &repaired, &ctx, &mut trace) {
            trace.states.push(RepairState::Revalidated);
            trace.status = ValidationStatus::Repaired;
            return OutreachOutcome {
                draft: repaired,
                trace,
            };
        }

        if let Some(last) = trace.validations.last() {
            emit_fallback(last);
        }
        METRICS.inc_fallbacks();
        trace.states.push(RepairState::Fallback);
        trace.status = ValidationStatus::Fallback;
        OutreachOutcome {
            draft: OutreachDraft::template(fallback_message(contact_name, &lead.company_name)),
            trace,
        }
    }
}

impl fmt::Debug for RepairController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepairController")
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationRule;
    use crate::validator::{RuleValidator, ValidatorConfig};

    #[test]
    fn fallback_mentions_contact_and_company() {
        let text = fallback_message("Sarah", "Acme Corp");
        assert!(text.starts_with("Hi Sarah,"));
        assert!(text.contains("Checking in regarding Acme Corp."));
    }

    #[test]
    fn fallback_passes_default_rules() {
        let validator = RuleValidator::new(ValidatorConfig::default());
        let ctx = ValidationContext {
            contact_name: "Sarah Thompson",
            company_name: "Acme Corp",
        };
        let draft = OutreachDraft::template(fallback_message("Sarah Thompson", "Acme Corp"));
        assert!(validator.validate(&draft, &ctx).passed);
    }

    #[test]
    fn repair_instructions_list_every_failed_rule() {
        let outcome = ValidationOutcome::from_reasons(
            [ValidationRule::MissingGreeting, ValidationRule::PiiLeak]
                .into_iter()
                .collect(),
        );
        let text = repair_instructions(&outcome, "Sarah", "Acme Corp");
        assert!(text.contains("Hi Sarah,"));
        assert!(text.contains(ValidationRule::MissingGreeting.describe()));
        assert!(text.contains(ValidationRule::PiiLeak.describe()));
    }

    struct RejectAll;

    impl DraftValidator for RejectAll {
        fn validate(&self, _: &OutreachDraft, _: &ValidationContext<'_>) -> ValidationOutcome {
            ValidationOutcome::from_reasons([ValidationRule::TooLong].into_iter().collect())
        }
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn fallback_is_logged_with_reasons() {
        let lead = LeadRecord {
            company_name: "Acme Corp".to_string(),
            industry: String::new(),
            employee_count: Some(10),
            stage: "Seed".to_string(),
            intent_signal: crate::domain::IntentSignal::Low,
            summary: String::new(),
            website: None,
            funding: None,
        };
        let controller =
            RepairController::new(DraftGenerator::template_only(), Arc::new(RejectAll));

        let outcome = controller.run(&lead, "Sarah", Tier::C).await;

        assert_eq!(outcome.status(), ValidationStatus::Fallback);
        assert!(logs_contain("draft.fallback"));
        assert!(logs_contain("too_long"));
    }

    #[test]
    fn trace_serializes_snake_case() {
        let mut trace = RepairTrace::new();
        trace.states.push(RepairState::Validated);
        let json = serde_json::to_value(&trace).unwrap();
        assert_eq!(json["states"][1], "validated");
        assert_eq!(json["status"], "valid");
        assert!(json.get("strategy").is_none());
    }
}
