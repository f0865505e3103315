//! Company research: where a [`LeadRecord`] comes from.
//!
//! - [`ResearchProvider`]: async lookup contract
//! - [`MockResearch`]: deterministic, offline provider used by default
//! - [`EnrichedResearch`]: overlays an optional [`Enrichment`] source on top
//!   of another provider, degrading silently to the baseline record

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::MAX_FIELD_CHARS;
use crate::domain::{IntentSignal, LeadRecord};
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::scrub::{contains_pii, scrub_pii};
use crate::validator::has_placeholder;

/// Research failures. Any of these aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResearchError {
    #[error("unknown company: {0}")]
    UnknownCompany(String),

    #[error("research source unavailable: {0}")]
    Unavailable(String),

    #[error("research returned an invalid record: {0}")]
    InvalidRecord(String),
}

/// Looks up firmographic data for a company.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn lookup(&self, company_name: &str) -> Result<LeadRecord, ResearchError>;
}

#[async_trait]
impl<T: ResearchProvider + ?Sized> ResearchProvider for Arc<T> {
    async fn lookup(&self, company_name: &str) -> Result<LeadRecord, ResearchError> {
        (**self).lookup(company_name).await
    }
}

// ---------------------------------------------------------------------------
// MockResearch
// ---------------------------------------------------------------------------

const STAGES: [&str; 4] = ["Seed", "Series A", "Series B", "Public"];
const EMPLOYEE_COUNTS: [i64; 5] = [25, 120, 500, 2_000, 10_000];
const INTENTS: [IntentSignal; 3] = [IntentSignal::Low, IntentSignal::Medium, IntentSignal::High];

/// Industry reported for every synthesized record.
pub const MOCK_INDUSTRY: &str = "Technology / SaaS";

/// Deterministic offline research.
///
/// Fields are picked from fixed tables using the SHA-256 of the lowercased
/// company name, so the same company always yields the same record.
#[derive(Debug, Clone, Default)]
pub struct MockResearch {
    unknown: BTreeSet<String>,
    pinned: HashMap<String, LeadRecord>,
}

impl MockResearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make lookups for `company_name` fail with `UnknownCompany`.
    pub fn with_unknown(mut self, company_name: impl AsRef<str>) -> Self {
        self.unknown.insert(normalize(company_name.as_ref()));
        self
    }

    /// Return `record` verbatim for its company name.
    pub fn with_record(mut self, record: LeadRecord) -> Self {
        self.pinned.insert(normalize(&record.company_name), record);
        self
    }

    fn synthesize(company_name: &str) -> LeadRecord {
        let hash = Sha256::digest(normalize(company_name).as_bytes());
        let pick = |byte: usize, len: usize| hash[byte] as usize % len;

        LeadRecord {
            company_name: company_name.to_string(),
            industry: MOCK_INDUSTRY.to_string(),
            employee_count: Some(EMPLOYEE_COUNTS[pick(0, EMPLOYEE_COUNTS.len())]),
            stage: STAGES[pick(1, STAGES.len())].to_string(),
            intent_signal: INTENTS[pick(2, INTENTS.len())],
            summary: format!("{company_name} is a company operating in the Technology vertical."),
            website: None,
            funding: None,
        }
    }
}

fn normalize(company_name: &str) -> String {
    company_name.trim().to_lowercase()
}

#[async_trait]
impl ResearchProvider for MockResearch {
    async fn lookup(&self, company_name: &str) -> Result<LeadRecord, ResearchError> {
        let key = normalize(company_name);
        if key.is_empty() || self.unknown.contains(&key) {
            return Err(ResearchError::UnknownCompany(company_name.to_string()));
        }

        let mut record = self
            .pinned
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Self::synthesize(company_name.trim()));
        record.summary = scrub_pii(&record.summary);

        tracing::debug!(
            company = %record.company_name,
            employees = ?record.employee_count,
            intent = %record.intent_signal,
            "mock research lookup"
        );
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Optional fields an enrichment source may supply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentData {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub funding: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl EnrichmentData {
    /// Overlay non-blank fields onto `lead`. The summary is PII-scrubbed.
    ///
    /// The industry is rendered into drafts, so one that is over-long, spans
    /// lines, or carries PII or placeholder text is ignored and the baseline
    /// industry kept.
    pub fn apply_to(self, lead: &mut LeadRecord) {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        if let Some(industry) = non_blank(self.industry) {
            if usable_industry(&industry) {
                lead.industry = industry;
            } else {
                tracing::warn!(
                    company = %lead.company_name,
                    "ignoring unusable enriched industry"
                );
            }
        }
        if let Some(funding) = non_blank(self.funding) {
            lead.funding = Some(funding);
        }
        if let Some(website) = non_blank(self.website) {
            lead.website = Some(website);
        }
        if let Some(summary) = non_blank(self.summary) {
            lead.summary = scrub_pii(&summary);
        }
    }
}

fn usable_industry(industry: &str) -> bool {
    industry.chars().count() <= MAX_FIELD_CHARS
        && !industry.chars().any(char::is_control)
        && !contains_pii(industry)
        && !has_placeholder(industry)
}

/// External enrichment source (e.g. a firmographics API).
#[async_trait]
pub trait Enrichment: Send + Sync {
    async fn enrich(&self, company_name: &str) -> Result<EnrichmentData, ResearchError>;
}

/// Research provider that enriches another provider's records.
///
/// Enrichment is best effort: each attempt is bounded by `timeout`, failed
/// attempts are retried per `policy`, and a final failure is logged and the
/// baseline record returned unchanged.
pub struct EnrichedResearch<P> {
    inner: P,
    enrichment: Arc<dyn Enrichment>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl<P: ResearchProvider> EnrichedResearch<P> {
    pub fn new(
        inner: P,
        enrichment: Arc<dyn Enrichment>,
        policy: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            inner,
            enrichment,
            policy,
            timeout,
        }
    }

    async fn enrich_once(&self, company_name: &str) -> Result<EnrichmentData, ResearchError> {
        tokio::time::timeout(self.timeout, self.enrichment.enrich(company_name))
            .await
            .map_err(|_| {
                ResearchError::Unavailable(format!(
                    "enrichment timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })?
    }
}

#[async_trait]
impl<P: ResearchProvider> ResearchProvider for EnrichedResearch<P> {
    async fn lookup(&self, company_name: &str) -> Result<LeadRecord, ResearchError> {
        let mut record = self.inner.lookup(company_name).await?;

        match retry_with_backoff(&self.policy, "enrichment", || self.enrich_once(company_name))
            .await
        {
            Ok(data) => {
                data.apply_to(&mut record);
                tracing::info!(company = %record.company_name, "enrichment applied");
            }
            Err(err) => {
                tracing::warn!(
                    company = %record.company_name,
                    error = %err,
                    "enrichment failed, keeping baseline record"
                );
            }
        }
        Ok(record)
    }
}
