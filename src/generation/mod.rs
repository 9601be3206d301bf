//! Generation orchestration.
//!
//! Pulls retrieval context from both collections, assembles the prompt,
//! calls the completion model, then validates and annotates the result.
//! Retrieval failures degrade to empty context; only a failed completion
//! call fails the whole request.

#[cfg(test)]
mod tests;

pub mod prompt;

use crate::config::RuleConfig;
use crate::database::lancedb::DocumentType;
use crate::llm::{CompletionClient, CompletionOptions};
use crate::retrieval::{RetrievalHit, RetrievalService, SearchFilters};
use crate::session::{HistoryEntry, SessionStore};
use crate::usage::{RequestType, UsageTracker};
use crate::validator::{ComplianceValidator, ValidationResult};
use crate::{MsgForgeError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const EXEMPLAR_K: usize = 3;
const PATTERN_K: usize = 2;
const POLICY_K: usize = 3;

const LOW_SCORE_THRESHOLD: f64 = 70.0;
const HIGH_SCORE_THRESHOLD: f64 = 85.0;
const MISSING_VARIABLE_SUGGESTIONS: usize = 3;

/// Where a request currently is in the pipeline. Used for progress
/// reporting; transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationPhase {
    RetrievingContext,
    Generating,
    Validating,
    Complete,
}

impl GenerationPhase {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RetrievingContext => "retrieving_context",
            Self::Generating => "generating",
            Self::Validating => "validating",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub session_id: String,
    pub user_request: String,
    pub business_type: Option<String>,
    pub category_1: Option<String>,
    pub category_2: Option<String>,
    pub target_length: Option<usize>,
    pub include_variables: Vec<String>,
}

impl GenerationRequest {
    #[inline]
    pub fn new(session_id: impl Into<String>, user_request: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_request: user_request.into(),
            business_type: None,
            category_1: None,
            category_2: None,
            target_length: None,
            include_variables: Vec::new(),
        }
    }
}

/// How much context actually reached the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferenceCounts {
    pub similar_exemplars: usize,
    pub category_patterns: usize,
    pub policy_passages: usize,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub template: String,
    pub validation: ValidationResult,
    pub suggestions: Vec<String>,
    pub references: ReferenceCounts,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

/// Deltas between the original and optimized validations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Improvement {
    pub compliance_score_change: f64,
    pub length_change: i64,
    pub variable_count_change: i64,
}

#[derive(Debug, Clone)]
pub struct OptimizationOutcome {
    pub original_template: String,
    pub optimized_template: String,
    pub original_validation: ValidationResult,
    pub optimized_validation: ValidationResult,
    pub improvement: Improvement,
}

/// Improvement suggestions for a validated template, ordered from most to
/// least structural.
pub fn build_suggestions(
    validation: &ValidationResult,
    exemplars: &[RetrievalHit],
    rules: &RuleConfig,
) -> Vec<String> {
    let mut suggestions = Vec::new();

    if validation.length < rules.optimal_min_length {
        suggestions.push("템플릿이 너무 짧습니다. 더 구체적인 정보를 추가해보세요.".to_string());
    } else if validation.length > rules.optimal_max_length {
        suggestions
            .push("템플릿이 너무 깁니다. 핵심 정보만 간결하게 표현해보세요.".to_string());
    }

    if !validation.has_greeting {
        suggestions.push(
            "'안녕하세요 #{고객성명}님,' 형태의 인사말을 추가하면 더 친근합니다.".to_string(),
        );
    }

    if validation.variable_count == 0 {
        suggestions.push(
            "개인화를 위해 최소 1개 이상의 변수(#{고객성명} 등)를 사용하세요.".to_string(),
        );
    } else if validation.variable_count > rules.max_checklist_variables {
        suggestions.push(format!(
            "변수가 너무 많습니다. {}개 이하로 줄여주세요.",
            rules.max_checklist_variables
        ));
    }

    if !validation.has_politeness {
        suggestions.push("'습니다', '바랍니다' 등 정중한 표현을 사용하세요.".to_string());
    }

    if validation.potential_ad_content {
        suggestions
            .push("할인, 이벤트 등 광고성 표현은 알림 메시지에서 사용할 수 없습니다.".to_string());
    }

    // Variables common in similar approved messages but absent here,
    // first-seen order across the exemplar hits.
    let mut missing: Vec<&str> = Vec::new();
    for hit in exemplars {
        for variable in &hit.chunk.variables {
            if !validation.distinct_variables.iter().any(|v| v == variable)
                && !missing.contains(&variable.as_str())
            {
                missing.push(variable);
            }
        }
    }
    if !missing.is_empty() {
        let listed = missing
            .iter()
            .take(MISSING_VARIABLE_SUGGESTIONS)
            .map(|v| format!("#{{{}}}", v))
            .collect::<Vec<_>>()
            .join(", ");
        suggestions.push(format!(
            "이 분류에서 자주 사용되는 변수를 고려해보세요: {}",
            listed
        ));
    }

    if validation.compliance_score < LOW_SCORE_THRESHOLD {
        suggestions.push("정책 준수도가 낮습니다. 위의 제안사항들을 반영해보세요.".to_string());
    } else if validation.compliance_score >= HIGH_SCORE_THRESHOLD {
        suggestions.push("훌륭합니다! 정책을 잘 준수하는 템플릿입니다.".to_string());
    }

    suggestions
}

pub struct GenerationOrchestrator {
    policies: RetrievalService,
    exemplars: RetrievalService,
    completion: Arc<dyn CompletionClient>,
    validator: ComplianceValidator,
    rules: RuleConfig,
    sessions: SessionStore,
    usage: UsageTracker,
}

impl GenerationOrchestrator {
    #[inline]
    pub fn new(
        policies: RetrievalService,
        exemplars: RetrievalService,
        completion: Arc<dyn CompletionClient>,
        validator: ComplianceValidator,
        rules: RuleConfig,
        usage: UsageTracker,
    ) -> Self {
        let sessions = SessionStore::new(rules.history_window);
        Self {
            policies,
            exemplars,
            completion,
            validator,
            rules,
            sessions,
            usage,
        }
    }

    #[inline]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Generate a template for the request. Retrieval failures are logged
    /// and the prompt proceeds with whatever context survived.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
        let started = Instant::now();
        debug!(
            phase = GenerationPhase::RetrievingContext.as_str(),
            session = %request.session_id,
            "Collecting retrieval context"
        );

        let (exemplar_hits, pattern_hits, policy_hits) = self.collect_context(request).await;
        let references = ReferenceCounts {
            similar_exemplars: exemplar_hits.len(),
            category_patterns: pattern_hits.len(),
            policy_passages: policy_hits.len(),
        };

        debug!(
            phase = GenerationPhase::Generating.as_str(),
            exemplars = references.similar_exemplars,
            patterns = references.category_patterns,
            policies = references.policy_passages,
            "Calling completion model"
        );

        let prompt = prompt::generation_prompt(
            request,
            &exemplar_hits,
            &pattern_hits,
            &policy_hits,
            &self.rules,
        );
        let completion = self
            .completion
            .complete(&prompt, &CompletionOptions::default())
            .map_err(|e| MsgForgeError::Generation(e.to_string()))?;

        debug!(
            phase = GenerationPhase::Validating.as_str(),
            "Validating generated template"
        );
        let validation = self.validator.validate(&completion.text);
        let suggestions = build_suggestions(&validation, &exemplar_hits, &self.rules);

        self.sessions
            .append(
                &request.session_id,
                HistoryEntry {
                    request_text: request.user_request.clone(),
                    generated_template: completion.text.clone(),
                    compliance_score: validation.compliance_score,
                    created_at: Utc::now(),
                },
            )
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if let Err(error) = self
            .usage
            .track(
                &request.session_id,
                RequestType::Generation,
                &completion,
                elapsed_ms,
            )
            .await
        {
            warn!("Failed to record usage for generation: {}", error);
        }

        info!(
            phase = GenerationPhase::Complete.as_str(),
            score = validation.compliance_score,
            length = validation.length,
            "Template generated"
        );

        Ok(GenerationOutcome {
            template: completion.text,
            validation,
            suggestions,
            references,
            model: completion.model,
            generated_at: Utc::now(),
        })
    }

    /// Rework an existing template and report how the two validations
    /// differ. Both validations run through the same validator.
    pub async fn optimize(
        &self,
        session_id: &str,
        template: &str,
        target_improvements: &[String],
    ) -> Result<OptimizationOutcome> {
        let started = Instant::now();
        let original_validation = self.validator.validate(template);

        let prompt =
            prompt::optimization_prompt(template, &original_validation, target_improvements);
        let completion = self
            .completion
            .complete(&prompt, &CompletionOptions::default())
            .map_err(|e| MsgForgeError::Generation(e.to_string()))?;

        let optimized_validation = self.validator.validate(&completion.text);
        let improvement = Improvement {
            compliance_score_change: optimized_validation.compliance_score
                - original_validation.compliance_score,
            length_change: optimized_validation.length as i64 - original_validation.length as i64,
            variable_count_change: optimized_validation.variable_count as i64
                - original_validation.variable_count as i64,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        if let Err(error) = self
            .usage
            .track(session_id, RequestType::Optimization, &completion, elapsed_ms)
            .await
        {
            warn!("Failed to record usage for optimization: {}", error);
        }

        info!(
            score_change = improvement.compliance_score_change,
            length_change = improvement.length_change,
            "Template optimized"
        );

        Ok(OptimizationOutcome {
            original_template: template.to_string(),
            optimized_template: completion.text,
            original_validation,
            optimized_validation,
            improvement,
        })
    }

    async fn collect_context(
        &self,
        request: &GenerationRequest,
    ) -> (Vec<RetrievalHit>, Vec<RetrievalHit>, Vec<RetrievalHit>) {
        let exemplar_filters = SearchFilters {
            document_type: Some(DocumentType::ApprovedTemplate),
            category: request.category_1.clone(),
            business_type: request.business_type.clone(),
        };
        let policy_filters = SearchFilters::document_type(DocumentType::Policy);

        let (exemplars, patterns, policies) = tokio::join!(
            self.exemplars
                .search(&request.user_request, EXEMPLAR_K, &exemplar_filters),
            self.search_patterns(request),
            self.policies
                .search(&request.user_request, POLICY_K, &policy_filters),
        );

        (
            degrade(exemplars, "exemplar"),
            degrade(patterns, "pattern"),
            degrade(policies, "policy"),
        )
    }

    /// Patterns are only consulted when the request names a category.
    async fn search_patterns(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<RetrievalHit>> {
        let Some(category) = &request.category_1 else {
            return Ok(Vec::new());
        };

        let filters = SearchFilters {
            document_type: Some(DocumentType::CategoryPattern),
            category: Some(category.clone()),
            business_type: None,
        };
        self.exemplars.search(category, PATTERN_K, &filters).await
    }
}

fn degrade(result: Result<Vec<RetrievalHit>>, kind: &str) -> Vec<RetrievalHit> {
    match result {
        Ok(hits) => hits,
        Err(error) => {
            warn!(
                "{}",
                MsgForgeError::RetrievalDegraded(format!("{} search failed: {}", kind, error))
            );
            Vec::new()
        }
    }
}
