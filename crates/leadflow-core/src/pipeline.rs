//! Pipeline coordination: research → score → outreach, one session per run.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use leadflow_state::{SessionId, SessionState, SessionStore};
use serde::Serialize;
use tracing::{info, warn, Instrument};

use crate::config::{PipelineConfig, MAX_FIELD_CHARS};
use crate::domain::{
    LeadRecord, LeadRequest, OutreachDraft, PipelineError, PipelineResult, PipelineStage, Result,
};
use crate::draft::DraftGenerator;
use crate::metrics::METRICS;
use crate::obs::{
    emit_persist_failed, emit_run_finished, emit_run_started, session_span, StageObserver,
    TracingObserver,
};
use crate::repair::{fallback_message, RepairController};
use crate::research::{EnrichedResearch, Enrichment, ResearchProvider};
use crate::retry::RetryPolicy;
use crate::scorer::score_lead;
use crate::transform::TextTransform;
use crate::validator::{DraftValidator, RuleValidator, ValidationContext};

/// Session slots written by a run, in order.
pub mod slots {
    pub const RESEARCH: &str = "research";
    /// Human-readable rendering of the research record, written with it.
    pub const LEAD_SUMMARY: &str = "lead_summary";
    pub const SCORE: &str = "score";
    pub const OUTREACH: &str = "outreach";
    pub const REPAIR: &str = "repair";
    pub const RESULT: &str = "result";
}

/// Attempts for enrichment calls, independent of polishing attempts.
const ENRICHMENT_ATTEMPTS: u32 = 2;

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    research: Arc<dyn ResearchProvider>,
    store: Arc<dyn SessionStore>,
    config: PipelineConfig,
    transform: Option<Arc<dyn TextTransform>>,
    enrichment: Option<Arc<dyn Enrichment>>,
    validator: Option<Arc<dyn DraftValidator>>,
    observer: Arc<dyn StageObserver>,
}

impl PipelineBuilder {
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transform(mut self, transform: Arc<dyn TextTransform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn enrichment(mut self, enrichment: Arc<dyn Enrichment>) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    /// Replace the default [`RuleValidator`] used on drafts.
    pub fn validator(mut self, validator: Arc<dyn DraftValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validate the configuration and assemble the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        let config = self.config;

        let research = match (config.enrichment_enabled, self.enrichment) {
            (true, Some(enrichment)) => Arc::new(EnrichedResearch::new(
                self.research,
                enrichment,
                RetryPolicy {
                    attempts: ENRICHMENT_ATTEMPTS,
                    base_delay: config.retry_backoff,
                },
                config.model_timeout,
            )) as Arc<dyn ResearchProvider>,
            (true, None) => {
                tracing::warn!("enrichment enabled but no enrichment source configured");
                self.research
            }
            (false, _) => self.research,
        };

        if config.polishing_enabled && self.transform.is_none() {
            tracing::warn!("polishing enabled but no text transform configured");
        }

        let screen = RuleValidator::new(config.validator.clone());
        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(screen.clone()) as Arc<dyn DraftValidator>);
        let generator = DraftGenerator::new(
            self.transform,
            config.polishing_enabled,
            config.model_timeout,
            config.retry_policy(),
        );

        Ok(Pipeline {
            controller: RepairController::new(generator, validator),
            screen,
            research,
            store: self.store,
            observer: self.observer,
            config,
        })
    }
}

/// Runs leads end to end. `Send + Sync`; share it behind an `Arc` to run
/// leads concurrently.
pub struct Pipeline {
    config: PipelineConfig,
    research: Arc<dyn ResearchProvider>,
    store: Arc<dyn SessionStore>,
    controller: RepairController,
    screen: RuleValidator,
    observer: Arc<dyn StageObserver>,
}

impl Pipeline {
    pub fn builder(
        research: Arc<dyn ResearchProvider>,
        store: Arc<dyn SessionStore>,
    ) -> PipelineBuilder {
        PipelineBuilder {
            research,
            store,
            config: PipelineConfig::default(),
            transform: None,
            enrichment: None,
            validator: None,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Run one lead through every stage.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for blank, over-long or unsafe names (no session is
    ///   created)
    /// - `SessionCreation` if the store cannot allocate a session
    /// - `ResearchUnavailable` if research fails (no draft is created)
    /// - `MissingField` / `InvalidInput` for an unusable employee count
    pub async fn run(&self, company_name: &str, contact_name: &str) -> Result<PipelineResult> {
        let started = Instant::now();
        METRICS.inc_runs_started();

        let result = self.run_inner(company_name, contact_name).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(done) => {
                METRICS.inc_runs_completed();
                emit_run_finished(
                    Some(&done.session_id),
                    duration_ms,
                    Some(done.validation_status),
                    true,
                );
            }
            Err(err) => {
                METRICS.inc_runs_failed();
                tracing::warn!(stage = %err.stage(), error = %err, "run failed");
                emit_run_finished(None, duration_ms, None, false);
            }
        }
        result
    }

    /// Run independent leads concurrently, one session each. Results are
    /// returned in input order.
    pub async fn run_batch(&self, cases: &[LeadRequest]) -> Vec<Result<PipelineResult>> {
        let runs = cases
            .iter()
            .map(|case| self.run(&case.company_name, &case.contact_name));
        let results = futures::future::join_all(runs).await;
        METRICS.flush();
        results
    }

    async fn run_inner(&self, company_name: &str, contact_name: &str) -> Result<PipelineResult> {
        let (company, contact) = self
            .observe(None, PipelineStage::Input, async {
                let company = self.screen_input("company_name", company_name)?;
                let contact = self.screen_input("contact_name", contact_name)?;
                self.screen_fallback(company, contact)?;
                Ok::<_, PipelineError>((company, contact))
            })
            .await?;
        emit_run_started(company, contact);

        let session_id = self
            .observe(None, PipelineStage::Session, self.store.create())
            .await
            .map_err(PipelineError::SessionCreation)?;

        self.run_session(&session_id, company, contact)
            .instrument(session_span(&session_id))
            .await
    }

    async fn run_session(
        &self,
        session_id: &SessionId,
        company: &str,
        contact: &str,
    ) -> Result<PipelineResult> {
        let sid = Some(session_id);

        let lead = self
            .observe(sid, PipelineStage::Research, self.research.lookup(company))
            .await
            .map_err(|source| PipelineError::ResearchUnavailable {
                company: company.to_string(),
                source,
            })?;
        let lead = self.settle_research(lead, company, contact);
        self.persist_research(session_id, &lead).await;

        let (employee_count, score) = self
            .observe(sid, PipelineStage::Score, async {
                let count = lead
                    .employee_count
                    .ok_or(PipelineError::MissingField("employee_count"))?;
                Ok::<_, PipelineError>((count, score_lead(count, lead.intent_signal)?))
            })
            .await?;
        let score_explanation = score.explanation(employee_count, lead.intent_signal);
        info!(score = score.score, tier = %score.tier, "lead scored");
        self.persist(session_id, slots::SCORE, &score).await;

        let outcome = self
            .observe(sid, PipelineStage::Outreach, async {
                Ok::<_, Infallible>(self.controller.run(&lead, contact, score.tier).await)
            })
            .await
            .unwrap_or_else(|never| match never {});
        self.persist(session_id, slots::OUTREACH, &outcome.draft).await;
        self.persist(session_id, slots::REPAIR, &outcome.trace).await;

        let result = PipelineResult {
            session_id: session_id.clone(),
            research: lead,
            score,
            score_explanation,
            validation_status: outcome.trace.status,
            outreach: outcome.draft,
            repair: outcome.trace,
        };
        self.persist(session_id, slots::RESULT, &result).await;
        Ok(result)
    }

    /// Trim and screen a caller-supplied name.
    fn screen_input<'a>(&self, field: &'static str, raw: &'a str) -> Result<&'a str> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(PipelineError::invalid(field, "must not be empty"));
        }
        if value.chars().count() > MAX_FIELD_CHARS {
            return Err(PipelineError::invalid(
                field,
                format!("must be at most {MAX_FIELD_CHARS} characters"),
            ));
        }
        if value.chars().any(char::is_control) {
            return Err(PipelineError::invalid(
                field,
                "must not contain control characters",
            ));
        }
        let flagged = self.screen.screen_field(value);
        if !flagged.is_empty() {
            let names: Vec<&str> = flagged.iter().map(|rule| rule.as_str()).collect();
            return Err(PipelineError::invalid(
                field,
                format!("rejected by content rules: {}", names.join(", ")),
            ));
        }
        Ok(value)
    }

    /// Reject name pairs whose fallback message would fail the content rules.
    ///
    /// Each name is screened on its own first; this catches patterns that
    /// only appear once both names sit inside the fixed fallback text.
    fn screen_fallback(&self, company: &str, contact: &str) -> Result<()> {
        let draft = OutreachDraft::template(fallback_message(contact, company));
        let ctx = ValidationContext {
            contact_name: contact,
            company_name: company,
        };
        let outcome = self.screen.validate(&draft, &ctx);
        if outcome.passed {
            return Ok(());
        }
        Err(PipelineError::invalid(
            "names",
            format!(
                "fallback message would be rejected: {}",
                outcome.reason_names().join(", ")
            ),
        ))
    }

    /// Hold research output to the same rules as caller input before any of
    /// it is rendered into a draft.
    ///
    /// A renamed company is kept only if it would pass input screening with
    /// this contact; otherwise the screened input name is used. An industry
    /// that fails screening is dropped and the template omits it.
    fn settle_research(&self, mut lead: LeadRecord, company: &str, contact: &str) -> LeadRecord {
        let researched = lead.company_name.trim().to_string();
        if researched == company {
            lead.company_name = researched;
        } else if self.screen_input("company_name", &researched).is_ok()
            && self.screen_fallback(&researched, contact).is_ok()
        {
            lead.company_name = researched;
        } else {
            warn!(
                input = %company,
                researched = %researched,
                "research renamed the company to an unusable name; keeping the input name"
            );
            lead.company_name = company.to_string();
        }

        let industry = lead.industry.trim().to_string();
        if !industry.is_empty() && self.screen_input("industry", &industry).is_err() {
            warn!(company = %lead.company_name, "dropping industry that fails content rules");
            lead.industry = String::new();
        } else {
            lead.industry = industry;
        }
        lead
    }

    async fn observe<T, E, F>(
        &self,
        session_id: Option<&SessionId>,
        stage: PipelineStage,
        fut: F,
    ) -> std::result::Result<T, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
    {
        self.observer.before_stage(session_id, stage);
        let started = Instant::now();
        let out = fut.await;
        self.observer
            .after_stage(session_id, stage, out.is_ok(), started.elapsed());
        out
    }

    /// Commit a stage output to its session slot. Failures are logged and
    /// absorbed; the in-memory value stays authoritative for the run.
    async fn persist<T: Serialize>(&self, session_id: &SessionId, slot: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                let patch = SessionState::with(slot, value);
                self.commit(session_id, slot, patch).await;
            }
            Err(err) => emit_persist_failed(session_id, slot, &err),
        }
    }

    /// The research record and its summary go out in one write.
    async fn persist_research(&self, session_id: &SessionId, lead: &LeadRecord) {
        match serde_json::to_value(lead) {
            Ok(record) => {
                let mut patch = SessionState::with(slots::RESEARCH, record);
                patch.insert(
                    slots::LEAD_SUMMARY,
                    serde_json::Value::String(lead.summary_text()),
                );
                self.commit(session_id, slots::RESEARCH, patch).await;
            }
            Err(err) => emit_persist_failed(session_id, slots::RESEARCH, &err),
        }
    }

    async fn commit(&self, session_id: &SessionId, slot: &str, patch: SessionState) {
        if let Err(err) = self
            .observe(
                Some(session_id),
                PipelineStage::Persist,
                self.store.put(session_id, patch),
            )
            .await
        {
            emit_persist_failed(session_id, slot, &err);
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}
