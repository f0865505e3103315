//! Leadflow CLI
//!
//! The `leadflow` command runs the sales-development pipeline from a shell.
//!
//! ## Commands
//!
//! - `run`: research, score and draft outreach for one lead
//! - `eval`: run the fixed evaluation cases and print a summary table
//! - `score`: score a lead from raw figures
//! - `validate`: check a draft against the outreach rules
//! - `sessions`: inspect or delete stored sessions
//! - `verify`: re-check a written result artifact

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use leadflow_adapters::{HttpEnrichment, HttpTextTransform};
use leadflow_core::{
    read_result_artifact, score_lead, write_result_artifact, DraftValidator, IntentSignal,
    LeadRequest, MockResearch, OutreachDraft, Pipeline, PipelineConfig, PipelineResult,
    RuleValidator, SessionId, SessionStore, ValidationContext, METRICS,
};
use leadflow_state::{MemorySessionStore, SurrealSessionStore};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "leadflow")]
#[command(author = "Leadflow Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Sales-development pipeline: research, score and draft outreach",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one company and contact
    Run {
        /// Company to research
        #[arg(short, long)]
        company: String,

        /// Contact to address the outreach to
        #[arg(short = 'n', long)]
        contact: String,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Write result.json and its digest under this directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Run the built-in evaluation cases concurrently
    Eval {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Score a lead from employee count and intent signal
    Score {
        /// Employee count
        #[arg(short, long, allow_negative_numbers = true)]
        employees: i64,

        /// Intent signal: high, medium or low
        #[arg(short, long)]
        intent: IntentSignal,
    },

    /// Validate a draft email (use '-' to read stdin)
    Validate {
        /// Draft file
        file: PathBuf,

        /// Company the draft must mention
        #[arg(short, long)]
        company: String,

        /// Contact the greeting must name
        #[arg(short = 'n', long)]
        contact: String,
    },

    /// Session management (uses LEADFLOW_SURREALDB_URL)
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Verify a result artifact against its digest
    Verify {
        /// Session ID
        session: String,

        /// Artifact directory the result was written to
        #[arg(short, long, default_value = ".leadflow/results")]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List stored sessions, oldest first
    List,
    /// Print one session's slots as JSON
    Show {
        /// Session ID
        id: String,
    },
    /// Delete a session
    Delete {
        /// Session ID
        id: String,
    },
}

/// Flags shared by commands that build a pipeline. Each flag only turns a
/// feature on; the `LEADFLOW_*` environment decides the defaults.
#[derive(Args, Debug, Clone, Default)]
struct PipelineArgs {
    /// Polish drafts with the LLM text transform
    #[arg(long)]
    polish: bool,

    /// Enrich research with the external enrichment API
    #[arg(long)]
    enrich: bool,

    /// Store sessions in SurrealDB instead of process memory
    #[arg(long)]
    surreal: bool,

    /// Per-call model timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Fixed evaluation cases.
const EVAL_CASES: [(&str, &str); 3] = [
    ("TechNova", "Sarah"),
    ("GreenEnergy", "Mike"),
    ("QuantumSoft", "Jen"),
];

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    leadflow_core::telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            company,
            contact,
            pipeline,
            out,
            format,
        } => cmd_run(&company, &contact, &pipeline, out.as_deref(), format).await,
        Commands::Eval { pipeline, format } => cmd_eval(&pipeline, format).await,
        Commands::Score { employees, intent } => cmd_score(employees, intent),
        Commands::Validate {
            file,
            company,
            contact,
        } => cmd_validate(&file, &company, &contact),
        Commands::Sessions { action } => {
            let store = SurrealSessionStore::from_env()
                .await
                .context("Failed to connect to session database")?;
            match action {
                SessionAction::List => cmd_sessions_list(&store).await,
                SessionAction::Show { id } => cmd_sessions_show(&store, &id).await,
                SessionAction::Delete { id } => cmd_sessions_delete(&store, &id).await,
            }
        }
        Commands::Verify { session, dir } => cmd_verify(&session, &dir),
    }
}

/// Resolve the effective config: environment first, then flag overrides.
fn resolve_config(args: &PipelineArgs) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env().context("Invalid LEADFLOW_* configuration")?;
    if args.polish {
        config.polishing_enabled = true;
    }
    if args.enrich {
        config.enrichment_enabled = true;
    }
    if let Some(ms) = args.timeout_ms {
        config.model_timeout = Duration::from_millis(ms);
    }
    Ok(config)
}

async fn build_pipeline(args: &PipelineArgs) -> Result<Pipeline> {
    let config = resolve_config(args)?;

    let store: Arc<dyn SessionStore> = if args.surreal {
        Arc::new(
            SurrealSessionStore::from_env()
                .await
                .context("Failed to connect to session database")?,
        )
    } else {
        Arc::new(MemorySessionStore::new())
    };

    let mut builder = Pipeline::builder(Arc::new(MockResearch::new()), store);

    // Missing credentials degrade to the template / baseline paths.
    if config.polishing_enabled {
        match HttpTextTransform::from_env() {
            Ok(transform) => {
                info!(model = %transform.config().model, "draft polishing enabled");
                builder = builder.transform(Arc::new(transform));
            }
            Err(e) => warn!(error = %e, "polishing requested but no text transform is configured"),
        }
    }
    if config.enrichment_enabled {
        match HttpEnrichment::from_env() {
            Ok(enrichment) => builder = builder.enrichment(Arc::new(enrichment)),
            Err(e) => warn!(error = %e, "enrichment requested but no enrichment API is configured"),
        }
    }

    builder
        .config(config)
        .build()
        .context("Invalid pipeline configuration")
}

/// Run the pipeline for one lead
async fn cmd_run(
    company: &str,
    contact: &str,
    args: &PipelineArgs,
    out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let pipeline = build_pipeline(args).await?;
    let result = pipeline
        .run(company, contact)
        .await
        .with_context(|| format!("Pipeline failed for {company}"))?;
    METRICS.flush();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_result(&result),
    }

    if let Some(dir) = out {
        let path = write_result_artifact(&result, dir)
            .with_context(|| format!("Failed to write artifact under {}", dir.display()))?;
        println!("Artifact: {}", path.display());
    }

    Ok(())
}

fn print_result(result: &PipelineResult) {
    println!("Session:    {}", result.session_id);
    println!("{}", result.research.summary_text());
    println!(
        "Score:      {:.2} (Tier {})",
        result.score.score,
        result.score.tier.as_str()
    );
    println!("            {}", result.score_explanation);
    println!("Validation: {}", result.validation_status.as_str());
    if let Some(strategy) = result.repair.strategy {
        println!("Repair:     {strategy}");
    }
    println!();
    println!("{}", result.outreach.text);
}

#[derive(Debug, Serialize)]
struct EvalRow {
    company: String,
    contact: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn eval_rows(
    cases: &[LeadRequest],
    results: Vec<leadflow_core::Result<PipelineResult>>,
) -> Vec<EvalRow> {
    cases
        .iter()
        .zip(results)
        .map(|(case, result)| {
            let mut row = EvalRow {
                company: case.company_name.clone(),
                contact: case.contact_name.clone(),
                ok: result.is_ok(),
                session_id: None,
                tier: None,
                validation: None,
                error: None,
            };
            match result {
                Ok(r) => {
                    row.session_id = Some(r.session_id);
                    row.tier = Some(r.score.tier.as_str().to_string());
                    row.validation = Some(r.validation_status.as_str().to_string());
                }
                Err(e) => row.error = Some(e.to_string()),
            }
            row
        })
        .collect()
}

/// Run the built-in evaluation cases
async fn cmd_eval(args: &PipelineArgs, format: OutputFormat) -> Result<()> {
    let pipeline = build_pipeline(args).await?;
    let cases: Vec<LeadRequest> = EVAL_CASES
        .iter()
        .map(|(company, contact)| LeadRequest::new(*company, *contact))
        .collect();

    let results = pipeline.run_batch(&cases).await;
    let rows = eval_rows(&cases, results);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            println!(
                "{:<15} | {:<10} | {:<6} | {:<4} | {:<10}",
                "Company", "Contact", "Status", "Tier", "Validation"
            );
            println!("{}", "-".repeat(57));
            for row in &rows {
                match &row.error {
                    None => println!(
                        "{:<15} | {:<10} | {:<6} | {:<4} | {:<10}",
                        row.company,
                        row.contact,
                        "PASS",
                        row.tier.as_deref().unwrap_or("-"),
                        row.validation.as_deref().unwrap_or("-"),
                    ),
                    Some(e) => println!(
                        "{:<15} | {:<10} | {:<6} | {e}",
                        row.company, row.contact, "ERROR"
                    ),
                }
            }
        }
    }

    let failed = rows.iter().filter(|r| !r.ok).count();
    if failed > 0 {
        bail!("{failed} of {} evaluation cases failed", rows.len());
    }
    Ok(())
}

/// Score from raw figures
fn cmd_score(employees: i64, intent: IntentSignal) -> Result<()> {
    let score = score_lead(employees, intent).context("Cannot score lead")?;
    println!("Score: {:.2} (Tier {})", score.score, score.tier.as_str());
    println!("{}", score.explanation(employees, intent));
    Ok(())
}

fn read_draft(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read draft from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read draft: {}", file.display()))
    }
}

/// Validate a draft against the configured rules
fn cmd_validate(file: &Path, company: &str, contact: &str) -> Result<()> {
    let config = PipelineConfig::from_env().context("Invalid LEADFLOW_* configuration")?;
    let validator = RuleValidator::new(config.validator);
    let draft = OutreachDraft::template(read_draft(file)?);
    let ctx = ValidationContext {
        contact_name: contact.trim(),
        company_name: company.trim(),
    };

    let outcome = validator.validate(&draft, &ctx);
    if outcome.passed {
        println!("PASS");
        return Ok(());
    }

    println!("FAIL");
    for rule in &outcome.reasons {
        println!("  - {}: {}", rule.as_str(), rule.describe());
    }
    bail!("Draft failed {} rule(s)", outcome.reasons.len())
}

async fn cmd_sessions_list(store: &dyn SessionStore) -> Result<()> {
    let sessions = store.list().await?;

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    for record in sessions {
        let slots: Vec<&str> = record.state.keys().collect();
        println!(
            "{}  {}  [{}]",
            record.session_id,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            slots.join(", ")
        );
    }
    Ok(())
}

async fn cmd_sessions_show(store: &dyn SessionStore, id: &str) -> Result<()> {
    let record = store
        .get(&SessionId(id.to_string()))
        .await
        .with_context(|| format!("Session not found: {id}"))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn cmd_sessions_delete(store: &dyn SessionStore, id: &str) -> Result<()> {
    if store.delete(&SessionId(id.to_string())).await? {
        println!("Deleted session {id}");
    } else {
        println!("No session {id}");
    }
    Ok(())
}

/// Re-hash a written artifact and print its summary
fn cmd_verify(session: &str, dir: &Path) -> Result<()> {
    let result = read_result_artifact(&SessionId(session.to_string()), dir)
        .with_context(|| format!("Artifact for session {session} failed verification"))?;
    println!("✓ Digest verified");
    print_result(&result);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_parses_shared_pipeline_flags() {
        let cli = Cli::try_parse_from([
            "leadflow", "run", "--company", "Acme Corp", "--contact", "Sarah", "--polish",
            "--timeout-ms", "250", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                company,
                contact,
                pipeline,
                format,
                out,
            } => {
                assert_eq!(company, "Acme Corp");
                assert_eq!(contact, "Sarah");
                assert!(pipeline.polish);
                assert!(!pipeline.enrich);
                assert_eq!(pipeline.timeout_ms, Some(250));
                assert_eq!(format, OutputFormat::Json);
                assert!(out.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn score_accepts_negative_and_parses_intent() {
        let cli =
            Cli::try_parse_from(["leadflow", "score", "--employees", "-5", "--intent", "HIGH"])
                .unwrap();
        match cli.command {
            Commands::Score { employees, intent } => {
                assert_eq!(employees, -5);
                assert_eq!(intent, IntentSignal::High);
            }
            _ => panic!("expected score"),
        }
        assert!(cmd_score(-5, IntentSignal::High).is_err());
    }

    #[test]
    fn unknown_intent_is_rejected_by_parser() {
        assert!(
            Cli::try_parse_from(["leadflow", "score", "--employees", "10", "--intent", "urgent"])
                .is_err()
        );
    }

    #[test]
    fn flags_override_but_never_disable() {
        let args = PipelineArgs {
            polish: true,
            timeout_ms: Some(1500),
            ..Default::default()
        };
        let config = resolve_config(&args).unwrap();
        assert!(config.polishing_enabled);
        assert_eq!(config.model_timeout, Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn eval_cases_all_succeed_on_defaults() {
        let pipeline = build_pipeline(&PipelineArgs::default()).await.unwrap();
        let cases: Vec<LeadRequest> = EVAL_CASES
            .iter()
            .map(|(company, contact)| LeadRequest::new(*company, *contact))
            .collect();
        let rows = eval_rows(&cases, pipeline.run_batch(&cases).await);

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.ok && r.session_id.is_some()));
        assert_eq!(rows[0].company, "TechNova");
    }

    #[test]
    fn validate_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.txt");
        std::fs::write(&path, "Hello there, quick note.").unwrap();
        assert!(cmd_validate(&path, "Acme Corp", "Sarah").is_err());

        let good = "Hi Sarah,\n\nI noticed Acme Corp is building in the Technology / SaaS \
                    space. We help teams like yours automate outreach.\n\nBest,\nSales-ops team";
        std::fs::write(&path, good).unwrap();
        cmd_validate(&path, "Acme Corp", "Sarah").unwrap();
    }

    #[tokio::test]
    async fn run_writes_verifiable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        cmd_run(
            "Acme Corp",
            "Sarah",
            &PipelineArgs::default(),
            Some(dir.path()),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let session = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .file_name();
        cmd_verify(session.to_str().unwrap(), dir.path()).unwrap();
    }
}
