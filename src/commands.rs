use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::database::lancedb::{DocumentType, VectorStore};
use crate::database::sqlite::Database;
use crate::database::sqlite::models::NewQueryRecord;
use crate::embeddings::ollama::OllamaClient;
use crate::generation::{GenerationOrchestrator, GenerationRequest};
use crate::llm::OllamaCompletionClient;
use crate::miner::{ExemplarRecord, PatternMiner, exemplar_document};
use crate::retrieval::{NewChunk, RetrievalService};
use crate::usage::UsageTracker;
use crate::validator::business::suggest_business_types;
use crate::validator::policy::{PolicyAuditor, Severity};
use crate::validator::ComplianceValidator;

pub const POLICY_COLLECTION: &str = "policies";
pub const EXEMPLAR_COLLECTION: &str = "exemplars";

/// One policy passage in the ingestion file.
#[derive(Debug, Deserialize)]
struct PolicyEntry {
    id: Option<String>,
    content: String,
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExemplarEntry {
    id: String,
    text: String,
    #[serde(default)]
    metadata: ExemplarEntryMetadata,
}

#[derive(Debug, Deserialize, Default)]
struct ExemplarEntryMetadata {
    #[serde(default = "default_category")]
    category_1: String,
    #[serde(default = "default_category")]
    category_2: String,
    #[serde(default = "default_category")]
    business_type: String,
    #[serde(default = "default_category")]
    service_type: String,
    #[serde(default)]
    button: Option<String>,
}

fn default_category() -> String {
    "기타".to_string()
}

fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(message);
    bar
}

async fn open_service(config: &Config, collection: &str) -> Result<RetrievalService> {
    let embedder = Arc::new(OllamaClient::new(config)?);
    let store = VectorStore::open(
        &config.vector_db_path(),
        collection,
        config.ollama.embedding_dimension as usize,
    )
    .await?;
    Ok(RetrievalService::new(store, embedder))
}

/// Load policy passages from a JSON file into the policy collection.
#[inline]
pub async fn ingest_policies(path: &Path, reset: bool) -> Result<()> {
    let config = Config::load()?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy file: {}", path.display()))?;
    let entries: Vec<PolicyEntry> =
        serde_json::from_str(&raw).context("Failed to parse policy file as JSON")?;

    if entries.is_empty() {
        println!("No policy passages found in {}", path.display());
        return Ok(());
    }

    let mut service = open_service(&config, POLICY_COLLECTION).await?;
    if reset {
        service.reset().await?;
        println!("Cleared existing policy collection");
    }

    info!("Ingesting {} policy passages", entries.len());
    let bar = progress_bar(entries.len() as u64, "Embedding policies");

    let batch_size = config.ollama.batch_size as usize;
    let mut total = 0;
    let chunks: Vec<NewChunk> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| NewChunk {
            source_id: entry
                .id
                .clone()
                .unwrap_or_else(|| format!("policy_{:03}", i)),
            document_type: DocumentType::Policy,
            category: entry.category.clone(),
            business_type: None,
            content: entry.content.clone(),
            embed_text: None,
            variables: Vec::new(),
            button: None,
        })
        .collect();

    for batch in chunks.chunks(batch_size) {
        total += service.ingest(batch.to_vec()).await?;
        bar.inc(batch.len() as u64);
    }
    bar.finish();

    println!(
        "{} Ingested {} policy passages",
        style("✓").green(),
        total
    );
    Ok(())
}

fn normalize_button(button: Option<String>) -> Option<String> {
    button.filter(|b| !b.trim().is_empty() && b != "X")
}

/// Load approved exemplars, mine per-category patterns, and store both in
/// the exemplar collection.
#[inline]
pub async fn load_exemplars(path: &Path, reset: bool) -> Result<()> {
    let config = Config::load()?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read exemplar file: {}", path.display()))?;
    let entries: Vec<ExemplarEntry> =
        serde_json::from_str(&raw).context("Failed to parse exemplar file as JSON")?;

    if entries.is_empty() {
        println!("No exemplars found in {}", path.display());
        return Ok(());
    }

    let records: Vec<ExemplarRecord> = entries
        .into_iter()
        .map(|entry| ExemplarRecord {
            source_id: entry.id,
            text: entry.text,
            category_1: entry.metadata.category_1,
            category_2: entry.metadata.category_2,
            business_type: entry.metadata.business_type,
            service_type: entry.metadata.service_type,
            button: normalize_button(entry.metadata.button),
        })
        .collect();

    let miner = PatternMiner::new(config.keywords.clone());
    let patterns = miner.mine(&records);
    println!(
        "Mined {} category patterns from {} exemplars",
        patterns.len(),
        records.len()
    );

    let mut service = open_service(&config, EXEMPLAR_COLLECTION).await?;
    if reset {
        service.reset().await?;
        println!("Cleared existing exemplar collection");
    }

    let mut chunks: Vec<NewChunk> = Vec::with_capacity(records.len() + patterns.len());
    for record in &records {
        let structure = miner.analyze_structure(record);
        chunks.push(NewChunk {
            source_id: record.source_id.clone(),
            document_type: DocumentType::ApprovedTemplate,
            category: Some(record.category_1.clone()),
            business_type: Some(record.business_type.clone()),
            content: record.text.clone(),
            embed_text: Some(exemplar_document(record, &structure)),
            variables: structure.variables,
            button: record.button.clone(),
        });
    }
    for pattern in &patterns {
        chunks.push(NewChunk {
            source_id: format!("pattern_{}", pattern.category.replace(['/', ' '], "_")),
            document_type: DocumentType::CategoryPattern,
            category: Some(pattern.category.clone()),
            business_type: None,
            content: pattern.render_text(),
            embed_text: None,
            variables: pattern.variable_names(),
            button: pattern.common_buttons.first().map(|(b, _)| b.clone()),
        });
    }

    let bar = progress_bar(chunks.len() as u64, "Embedding exemplars");
    let batch_size = config.ollama.batch_size as usize;
    let mut total = 0;
    for batch in chunks.chunks(batch_size) {
        total += service.ingest(batch.to_vec()).await?;
        bar.inc(batch.len() as u64);
    }
    bar.finish();

    println!(
        "{} Ingested {} chunks ({} exemplars, {} patterns)",
        style("✓").green(),
        total,
        records.len(),
        patterns.len()
    );
    Ok(())
}

async fn build_orchestrator(
    config: &Config,
    database: Database,
) -> Result<GenerationOrchestrator> {
    let policies = open_service(config, POLICY_COLLECTION).await?;
    let exemplars = open_service(config, EXEMPLAR_COLLECTION).await?;
    let completion = Arc::new(OllamaCompletionClient::new(config)?);
    let validator = ComplianceValidator::new(config);
    let usage = UsageTracker::new(database);

    Ok(GenerationOrchestrator::new(
        policies,
        exemplars,
        completion,
        validator,
        config.rules.clone(),
        usage,
    ))
}

/// Generate a new template from a free-form request.
#[inline]
#[allow(clippy::too_many_arguments)]
pub async fn generate(
    request_text: String,
    session: Option<String>,
    business_type: Option<String>,
    category_1: Option<String>,
    category_2: Option<String>,
    target_length: Option<usize>,
    include_variables: Vec<String>,
) -> Result<()> {
    let config = Config::load()?;
    let database = Database::new(config.database_path().to_string_lossy().as_ref())
        .await
        .context("Failed to initialize database")?;
    let orchestrator = build_orchestrator(&config, database.clone()).await?;

    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());
    let request = GenerationRequest {
        session_id: session_id.clone(),
        user_request: request_text.clone(),
        business_type,
        category_1,
        category_2,
        target_length,
        include_variables,
    };

    let outcome = orchestrator.generate(&request).await?;

    database
        .record_query(NewQueryRecord {
            session_id: session_id.clone(),
            request_text,
            generated_template: Some(outcome.template.clone()),
            compliance_score: Some(outcome.validation.compliance_score),
        })
        .await
        .context("Failed to persist query record")?;

    println!("{}", style("Generated template:").bold());
    println!("{}", outcome.template);
    println!();
    println!(
        "Compliance score: {} ({} chars, {} variables, {} sentences)",
        style(format!("{:.1}", outcome.validation.compliance_score)).cyan(),
        outcome.validation.length,
        outcome.validation.variable_count,
        outcome.validation.sentence_count
    );
    println!(
        "Context used: {} exemplars, {} patterns, {} policies",
        outcome.references.similar_exemplars,
        outcome.references.category_patterns,
        outcome.references.policy_passages
    );
    if !outcome.suggestions.is_empty() {
        println!();
        println!("{}", style("Suggestions:").bold());
        for suggestion in &outcome.suggestions {
            println!("  - {}", suggestion);
        }
    }
    println!();
    println!("Session: {}", session_id);
    Ok(())
}

/// Optimize an existing template and report the change.
#[inline]
pub async fn optimize(
    template: String,
    session: Option<String>,
    improvements: Vec<String>,
) -> Result<()> {
    let config = Config::load()?;
    let database = Database::new(config.database_path().to_string_lossy().as_ref())
        .await
        .context("Failed to initialize database")?;
    let orchestrator = build_orchestrator(&config, database).await?;

    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());
    let outcome = orchestrator
        .optimize(&session_id, &template, &improvements)
        .await?;

    println!("{}", style("Optimized template:").bold());
    println!("{}", outcome.optimized_template);
    println!();
    println!(
        "Score: {:.1} -> {:.1} ({:+.1})",
        outcome.original_validation.compliance_score,
        outcome.optimized_validation.compliance_score,
        outcome.improvement.compliance_score_change
    );
    println!(
        "Length: {} -> {} chars ({:+})",
        outcome.original_validation.length,
        outcome.optimized_validation.length,
        outcome.improvement.length_change
    );
    println!(
        "Variables: {} -> {} ({:+})",
        outcome.original_validation.variable_count,
        outcome.optimized_validation.variable_count,
        outcome.improvement.variable_count_change
    );
    Ok(())
}

/// Run both scoring strategies over a template and print the findings.
#[inline]
pub fn validate_text(text: &str, business_type: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let validator = ComplianceValidator::new(&config);
    let auditor = PolicyAuditor::new(config.keywords.clone(), config.rules.clone());

    let validation = validator.validate(text);
    println!("{}", style("Checklist validation:").bold());
    println!(
        "  Length: {} chars (appropriate: {})",
        validation.length, validation.length_appropriate
    );
    println!(
        "  Variables: {} distinct / {} occurrences",
        validation.variable_count, validation.occurrence_count
    );
    println!("  Sentences: {}", validation.sentence_count);
    println!("  Greeting: {}", validation.has_greeting);
    println!("  Politeness: {}", validation.has_politeness);
    println!("  Advertising content: {}", validation.potential_ad_content);
    println!(
        "  Compliance score: {}",
        style(format!("{:.1}", validation.compliance_score)).cyan()
    );

    let audit = auditor.audit(text);
    println!();
    println!("{}", style("Policy audit:").bold());
    if audit.violations.is_empty() {
        println!("  {} No violations", style("✓").green());
    } else {
        for violation in &audit.violations {
            let marker = match violation.severity {
                Severity::Critical => style("✗").red(),
                Severity::Warning => style("!").yellow(),
            };
            println!("  {} {}", marker, violation.message);
            if let Some(details) = &violation.details {
                println!("      {}", details);
            }
        }
    }
    println!(
        "  Penalty score: {:.1} ({})",
        audit.compliance_score,
        if audit.passed { "passed" } else { "failed" }
    );
    for suggestion in &audit.suggestions {
        println!("  - {}", suggestion);
    }

    match business_type {
        Some(business_type) => {
            let warnings = auditor.business_warnings(text, business_type);
            if !warnings.is_empty() {
                println!();
                println!("{}", style("Business warnings:").bold());
                for warning in &warnings {
                    println!("  ! {}", warning);
                }
            }
        }
        None => {
            let suggestions = suggest_business_types(text, None);
            if !suggestions.is_empty() {
                println!();
                println!("{}", style("Possible business types:").bold());
                for suggestion in suggestions {
                    println!(
                        "  {} ({:.0}%, matched: {})",
                        suggestion.business_type,
                        suggestion.confidence * 100.0,
                        suggestion.matched_keywords.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}

/// Show collection sizes, session counts, and accumulated cost.
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load()?;

    let policies = open_service(&config, POLICY_COLLECTION).await?;
    let exemplars = open_service(&config, EXEMPLAR_COLLECTION).await?;
    let database = Database::new(config.database_path().to_string_lossy().as_ref())
        .await
        .context("Failed to initialize database")?;

    println!("{}", style("msgforge status").bold());
    println!();
    println!("Collections:");
    println!("  Policies:  {} chunks", policies.count().await?);
    println!("  Exemplars: {} chunks", exemplars.count().await?);
    println!();
    println!("Sessions: {}", database.count_sessions().await?);
    println!("Generations recorded: {}", database.count_queries().await?);
    println!("Total completion cost: ${:.6}", database.total_usage_cost().await?);
    println!();
    println!(
        "Ollama: {} (embeddings: {}, completions: {})",
        config
            .ollama_url()
            .map(|u| u.to_string())
            .unwrap_or_else(|_| "invalid".to_string()),
        config.ollama.embedding_model,
        config.ollama.completion_model
    );

    Ok(())
}
