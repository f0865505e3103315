//! End-to-end pipeline scenarios over in-memory and SurrealDB session stores.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{
    acme, lead, AlwaysFail, FullStore, ReadOnlyStore, RecordingObserver, StallingTransform,
};
use leadflow_core::pipeline::slots;
use leadflow_core::{
    fallback_message, DraftValidator, Enrichment, EnrichmentData, IntentSignal, LeadRecord,
    LeadRequest, MockResearch, Pipeline, PipelineConfig, PipelineError, PipelineStage,
    ResearchError, ResearchProvider, RuleValidator, Tier, ValidationContext, ValidationStatus,
};
use leadflow_state::{MemorySessionStore, SessionStore, SurrealSessionStore};

fn research() -> MockResearch {
    MockResearch::new()
        .with_record(acme())
        .with_record(lead("GreenEnergy", Some(120), IntentSignal::Medium))
        .with_record(lead("QuantumSoft", Some(25), IntentSignal::Low))
        .with_unknown("Nowhere Inc")
}

fn pipeline_with(store: Arc<dyn SessionStore>) -> Pipeline {
    Pipeline::builder(Arc::new(research()), store).build().unwrap()
}

#[tokio::test]
async fn test_acme_high_intent_is_tier_a_and_valid() {
    let store = Arc::new(MemorySessionStore::new());
    let pipeline = pipeline_with(store.clone());

    let result = pipeline.run("Acme Corp", "Sarah Thompson").await.unwrap();

    assert_eq!(result.score.score, 20.0);
    assert_eq!(result.score.tier, Tier::A);
    assert_eq!(result.validation_status, ValidationStatus::Valid);
    assert!(result.outreach.text.starts_with("Hi Sarah Thompson,"));
    assert!(result.outreach.text.contains("Acme Corp"));
    assert!(result.score_explanation.contains("Tier A"));
    assert!(result.score_explanation.contains("500 employees"));

    let record = store.get(&result.session_id).await.unwrap();
    for slot in [
        slots::RESEARCH,
        slots::SCORE,
        slots::OUTREACH,
        slots::REPAIR,
        slots::RESULT,
    ] {
        assert!(record.state.get(slot).is_some(), "missing slot {slot}");
    }
    assert_eq!(record.state.get(slots::SCORE).unwrap()["tier"], "A");
    let summary = record.state.get(slots::LEAD_SUMMARY).unwrap();
    assert_eq!(summary.as_str(), Some(result.research.summary_text().as_str()));
    assert!(result.research.summary_text().contains("Company: Acme Corp"));
    assert_eq!(
        record.state.get(slots::RESULT).unwrap()["validation_status"],
        "valid"
    );
}

#[tokio::test]
async fn test_inputs_are_trimmed() {
    let pipeline = pipeline_with(Arc::new(MemorySessionStore::new()));
    let result = pipeline.run("  Acme Corp ", " Sarah ").await.unwrap();
    assert!(result.outreach.text.starts_with("Hi Sarah,"));
    assert_eq!(result.research.company_name, "Acme Corp");
}

#[tokio::test(start_paused = true)]
async fn test_always_timing_out_transform_still_produces_outreach() {
    let transform = StallingTransform::new();
    let config = PipelineConfig {
        polishing_enabled: true,
        model_timeout: Duration::from_millis(100),
        retry_backoff: Duration::from_millis(10),
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::builder(Arc::new(research()), Arc::new(MemorySessionStore::new()))
        .config(config)
        .transform(transform.clone())
        .build()
        .unwrap();

    let result = pipeline.run("Acme Corp", "Sarah").await.unwrap();

    assert!(matches!(
        result.validation_status,
        ValidationStatus::Valid | ValidationStatus::Fallback
    ));
    assert!(!result.outreach.text.trim().is_empty());
    assert!(transform.calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_failing_validator_uses_fallback() {
    let pipeline = Pipeline::builder(Arc::new(research()), Arc::new(MemorySessionStore::new()))
        .validator(Arc::new(AlwaysFail::default()))
        .build()
        .unwrap();

    let result = pipeline.run("QuantumSoft", "Jen").await.unwrap();

    assert_eq!(result.validation_status, ValidationStatus::Fallback);
    assert_eq!(result.outreach.text, fallback_message("Jen", "QuantumSoft"));
    assert_eq!(result.repair.validations.len(), 2);
}

#[tokio::test]
async fn test_unknown_company_fails_before_drafting() {
    let store = Arc::new(MemorySessionStore::new());
    let pipeline = pipeline_with(store.clone());

    let err = pipeline.run("Nowhere Inc", "Sam").await.unwrap_err();

    match &err {
        PipelineError::ResearchUnavailable { company, source } => {
            assert_eq!(company, "Nowhere Inc");
            assert!(matches!(source, ResearchError::UnknownCompany(_)));
        }
        other => panic!("expected ResearchUnavailable, got {other:?}"),
    }
    assert_eq!(err.stage(), PipelineStage::Research);

    let sessions = store.list().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].state.get(slots::OUTREACH).is_none());
    assert!(sessions[0].state.get(slots::RESEARCH).is_none());
}

#[tokio::test]
async fn test_session_allocation_failure_is_fatal() {
    let pipeline = Pipeline::builder(Arc::new(research()), Arc::new(FullStore))
        .build()
        .unwrap();
    let err = pipeline.run("Acme Corp", "Sarah").await.unwrap_err();
    assert!(matches!(err, PipelineError::SessionCreation(_)));
}

#[tokio::test]
async fn test_missing_employee_count_is_rejected() {
    let research = MockResearch::new().with_record(lead("Stealth Co", None, IntentSignal::High));
    let store = Arc::new(MemorySessionStore::new());
    let pipeline = Pipeline::builder(Arc::new(research), store.clone())
        .build()
        .unwrap();

    let err = pipeline.run("Stealth Co", "Ada").await.unwrap_err();

    assert!(matches!(err, PipelineError::MissingField("employee_count")));
    let sessions = store.list().await.unwrap();
    assert!(sessions[0].state.get(slots::RESEARCH).is_some());
    assert!(sessions[0].state.get(slots::SCORE).is_none());
}

#[tokio::test]
async fn test_negative_employee_count_is_rejected() {
    let research = MockResearch::new().with_record(lead("Odd Co", Some(-5), IntentSignal::Low));
    let pipeline = Pipeline::builder(Arc::new(research), Arc::new(MemorySessionStore::new()))
        .build()
        .unwrap();

    let err = pipeline.run("Odd Co", "Ada").await.unwrap_err();
    match err {
        PipelineError::InvalidInput { field, .. } => assert_eq!(field, "employee_count"),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unsafe_input_is_rejected_without_a_session() {
    let store = Arc::new(MemorySessionStore::new());
    let pipeline = pipeline_with(store.clone());

    for (company, contact) in [
        ("", "Sarah"),
        ("Acme Corp", "   "),
        ("Acme Corp", "sarah@acme.io"),
        ("{{company}}", "Sarah"),
        ("Acme Corp", "Sarah\nThompson"),
    ] {
        let err = pipeline.run(company, contact).await.unwrap_err();
        assert!(
            matches!(err, PipelineError::InvalidInput { .. }),
            "{company:?}/{contact:?} gave {err:?}"
        );
    }
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_put_failures_are_absorbed() {
    let store = Arc::new(ReadOnlyStore::default());
    let pipeline = pipeline_with(store.clone());

    let result = pipeline.run("Acme Corp", "Sarah").await.unwrap();

    assert_eq!(result.validation_status, ValidationStatus::Valid);
    assert_eq!(store.failed_puts.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_observer_sees_every_stage_in_order() {
    let observer = Arc::new(RecordingObserver::default());
    let pipeline = Pipeline::builder(Arc::new(research()), Arc::new(MemorySessionStore::new()))
        .observer(observer.clone())
        .build()
        .unwrap();

    pipeline.run("Acme Corp", "Sarah").await.unwrap();

    let finished = observer.finished.lock().unwrap().clone();
    let stages: Vec<PipelineStage> = finished.iter().map(|(stage, _)| *stage).collect();
    assert_eq!(
        stages,
        vec![
            PipelineStage::Input,
            PipelineStage::Session,
            PipelineStage::Research,
            PipelineStage::Persist,
            PipelineStage::Score,
            PipelineStage::Persist,
            PipelineStage::Outreach,
            PipelineStage::Persist,
            PipelineStage::Persist,
            PipelineStage::Persist,
        ]
    );
    assert!(finished.iter().all(|(_, ok)| *ok));
    assert_eq!(observer.started.lock().unwrap().len(), finished.len());
}

#[tokio::test]
async fn test_batch_runs_are_isolated_and_ordered() {
    let store = Arc::new(MemorySessionStore::new());
    let pipeline = pipeline_with(store.clone());
    let cases = vec![
        LeadRequest::new("Acme Corp", "Sarah"),
        LeadRequest::new("GreenEnergy", "Mike"),
        LeadRequest::new("Nowhere Inc", "Sam"),
        LeadRequest::new("QuantumSoft", "Jen"),
    ];

    let results = pipeline.run_batch(&cases).await;

    assert_eq!(results.len(), 4);
    let ok: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(ok.len(), 3);
    assert_eq!(ok[0].research.company_name, "Acme Corp");
    assert_eq!(ok[1].research.company_name, "GreenEnergy");
    assert_eq!(ok[2].research.company_name, "QuantumSoft");
    assert_eq!(ok[1].score.tier, Tier::B);
    assert_eq!(ok[2].score.tier, Tier::C);
    assert!(matches!(
        results[2],
        Err(PipelineError::ResearchUnavailable { .. })
    ));

    assert_ne!(ok[0].session_id, ok[1].session_id);
    assert!(ok[1].outreach.text.contains("Mike"));
    assert!(!ok[1].outreach.text.contains("Sarah"));
    assert_eq!(store.list().await.unwrap().len(), 4);
}

struct FixedEnrichment;

#[async_trait]
impl Enrichment for FixedEnrichment {
    async fn enrich(&self, company_name: &str) -> Result<EnrichmentData, ResearchError> {
        Ok(EnrichmentData {
            industry: Some("SaaS".to_string()),
            funding: Some("Series C".to_string()),
            website: Some(format!(
                "https://www.{}.com",
                company_name.to_lowercase().replace(' ', "")
            )),
            summary: None,
        })
    }
}

#[tokio::test]
async fn test_enrichment_is_applied_only_when_enabled() {
    let enabled = PipelineConfig {
        enrichment_enabled: true,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::builder(Arc::new(research()), Arc::new(MemorySessionStore::new()))
        .config(enabled)
        .enrichment(Arc::new(FixedEnrichment))
        .build()
        .unwrap();
    let result = pipeline.run("Acme Corp", "Sarah").await.unwrap();
    assert_eq!(result.research.funding.as_deref(), Some("Series C"));
    assert_eq!(
        result.research.website.as_deref(),
        Some("https://www.acmecorp.com")
    );
    assert!(result.outreach.text.contains("SaaS space"));

    let pipeline = Pipeline::builder(Arc::new(research()), Arc::new(MemorySessionStore::new()))
        .enrichment(Arc::new(FixedEnrichment))
        .build()
        .unwrap();
    let result = pipeline.run("Acme Corp", "Sarah").await.unwrap();
    assert_eq!(result.research.funding, None);
}

#[tokio::test]
async fn test_surreal_store_end_to_end() {
    let store = Arc::new(SurrealSessionStore::in_memory().await.unwrap());
    let pipeline = pipeline_with(store.clone());

    let result = pipeline.run("GreenEnergy", "Mike").await.unwrap();

    let record = store.get(&result.session_id).await.unwrap();
    let stored = record.state.get(slots::RESULT).unwrap();
    assert_eq!(stored["session_id"], result.session_id.as_str());
    assert_eq!(stored["score"]["tier"], "B");
}

/// Returns Acme's record under a different name.
struct RenamingResearch {
    name: &'static str,
}

#[async_trait]
impl ResearchProvider for RenamingResearch {
    async fn lookup(&self, _company_name: &str) -> Result<LeadRecord, ResearchError> {
        let mut record = acme();
        record.company_name = self.name.to_string();
        Ok(record)
    }
}

#[tokio::test]
async fn test_unsafe_renamed_company_is_replaced_by_input_name() {
    let research = Arc::new(RenamingResearch {
        name: "Acme Corp - guaranteed growth",
    });
    let pipeline = Pipeline::builder(research.clone(), Arc::new(MemorySessionStore::new()))
        .build()
        .unwrap();
    let result = pipeline.run("Acme Corp", "Sarah").await.unwrap();
    assert_eq!(result.research.company_name, "Acme Corp");
    assert_eq!(result.validation_status, ValidationStatus::Valid);

    let pipeline = Pipeline::builder(research, Arc::new(MemorySessionStore::new()))
        .validator(Arc::new(AlwaysFail::default()))
        .build()
        .unwrap();
    let result = pipeline.run("Acme Corp", "Sarah").await.unwrap();
    assert_eq!(result.validation_status, ValidationStatus::Fallback);
    assert_eq!(result.outreach.text, fallback_message("Sarah", "Acme Corp"));
    let ctx = ValidationContext {
        contact_name: "Sarah",
        company_name: "Acme Corp",
    };
    assert!(RuleValidator::default().validate(&result.outreach, &ctx).passed);
}

#[tokio::test]
async fn test_safe_canonical_company_name_is_kept() {
    let pipeline = Pipeline::builder(
        Arc::new(RenamingResearch {
            name: "Acme Corporation",
        }),
        Arc::new(MemorySessionStore::new()),
    )
    .build()
    .unwrap();
    let result = pipeline.run("acme", "Sarah").await.unwrap();
    assert_eq!(result.research.company_name, "Acme Corporation");
    assert!(result.outreach.text.contains("Acme Corporation"));
    assert_eq!(result.validation_status, ValidationStatus::Valid);
}

struct BannedIndustryEnrichment;

#[async_trait]
impl Enrichment for BannedIndustryEnrichment {
    async fn enrich(&self, _company_name: &str) -> Result<EnrichmentData, ResearchError> {
        Ok(EnrichmentData {
            industry: Some("Guaranteed Growth Tech".to_string()),
            ..Default::default()
        })
    }
}

#[tokio::test]
async fn test_enriched_industry_failing_content_rules_is_dropped() {
    let config = PipelineConfig {
        enrichment_enabled: true,
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::builder(Arc::new(research()), Arc::new(MemorySessionStore::new()))
        .config(config)
        .enrichment(Arc::new(BannedIndustryEnrichment))
        .build()
        .unwrap();

    let result = pipeline.run("Acme Corp", "Sarah").await.unwrap();

    assert_eq!(result.research.industry, "");
    assert!(result.outreach.text.contains("I came across Acme Corp"));
    assert_eq!(result.validation_status, ValidationStatus::Valid);
}
