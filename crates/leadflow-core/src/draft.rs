//! First-draft generation: deterministic template, optionally polished.
//!
//! The template only uses facts the pipeline already holds (contact name,
//! company name, industry, tier). Polishing asks the text transform for a
//! tone-only rewrite; anything it returns is scrubbed and still has to pass
//! validation.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{LeadRecord, OutreachDraft, Tier};
use crate::metrics::METRICS;
use crate::obs::emit_transform_degraded;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::scrub::scrub_pii;
use crate::transform::{transform_with_timeout, TextTransform};

/// Instructions sent with every polish request.
pub const POLISH_INSTRUCTIONS: &str = "Polish the following outreach email for tone and clarity. \
Keep the greeting line and the company name exactly as written. \
Do not add any facts, figures, claims, names, links, email addresses or phone numbers \
that are not already in the email. Do not use placeholders. \
Return only the email text.";

/// Call to action for a tier: direct for A, softer for B, low-commitment for C.
pub fn call_to_action(tier: Tier) -> &'static str {
    match tier {
        Tier::A => {
            "Would you be open to a 15-minute sync this week to see how this could fit your team?"
        }
        Tier::B => {
            "If you're open to a 15-minute sync, I'd love to share how this could work for your team."
        }
        Tier::C => "Happy to send over a short overview if that would be useful.",
    }
}

/// Produces first drafts for the repair controller.
#[derive(Clone)]
pub struct DraftGenerator {
    transform: Option<Arc<dyn TextTransform>>,
    polishing_enabled: bool,
    timeout: Duration,
    policy: RetryPolicy,
}

impl DraftGenerator {
    /// Template-only generator.
    pub fn template_only() -> Self {
        Self {
            transform: None,
            polishing_enabled: false,
            timeout: Duration::from_secs(10),
            policy: RetryPolicy::once(),
        }
    }

    pub fn new(
        transform: Option<Arc<dyn TextTransform>>,
        polishing_enabled: bool,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transform,
            polishing_enabled,
            timeout,
            policy,
        }
    }

    /// The transform, if polishing is enabled and one is configured.
    pub fn active_transform(&self) -> Option<&Arc<dyn TextTransform>> {
        self.transform.as_ref().filter(|_| self.polishing_enabled)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Render the deterministic template.
    pub fn render_template(lead: &LeadRecord, contact_name: &str, tier: Tier) -> String {
        let industry = lead.industry.trim();
        let opener = if industry.is_empty() {
            format!("I came across {} and wanted to reach out.", lead.company_name)
        } else {
            format!(
                "I noticed {} is building in the {} space.",
                lead.company_name, industry
            )
        };

        format!(
            "Hi {contact_name},\n\n\
             {opener} We help teams like yours accelerate sales operations by \
             automating lead qualification and outreach.\n\n\
             {cta}\n\n\
             Best,\nSales-ops team",
            cta = call_to_action(tier),
        )
    }

    /// Produce the first draft. Never fails: any transform problem degrades
    /// to the template.
    pub async fn generate(
        &self,
        lead: &LeadRecord,
        contact_name: &str,
        tier: Tier,
    ) -> OutreachDraft {
        let template = Self::render_template(lead, contact_name, tier);
        let Some(transform) = self.active_transform() else {
            return OutreachDraft::template(template);
        };

        let polished = retry_with_backoff(&self.policy, "polish", || {
            transform_with_timeout(transform.as_ref(), &template, POLISH_INSTRUCTIONS, self.timeout)
        })
        .await;

        match polished {
            Ok(text) => {
                tracing::debug!(transform = transform.name(), "draft polished");
                OutreachDraft::polished(scrub_pii(&text))
            }
            Err(err) => {
                METRICS.inc_transform_failures();
                emit_transform_degraded("polish", &err);
                OutreachDraft::template(template)
            }
        }
    }
}

impl std::fmt::Debug for DraftGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftGenerator")
            .field("transform", &self.transform.as_ref().map(|t| t.name().to_string()))
            .field("polishing_enabled", &self.polishing_enabled)
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .finish()
    }
}
