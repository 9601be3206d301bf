//! Deterministic message-text analysis.
//!
//! Everything in this module is pure and synchronous: no I/O, no external
//! calls. Two scoring strategies live here and stay separate: the
//! checklist ratio used at generation time ([`checklist_score`]) and the
//! penalty subtraction used by the policy audit
//! ([`policy::penalty_score`]).

pub mod business;
pub mod policy;

#[cfg(test)]
mod tests;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::config::{Config, KeywordConfig, RuleConfig};

/// Template variable syntax: `#{` followed by one or more non-`}` characters.
/// The validity subset for the name itself is checked separately by
/// [`policy::is_valid_variable_name`].
pub static VARIABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[expect(clippy::unwrap_used, reason = "pattern is a compile-time constant")]
    Regex::new(r"#\{([^}]+)\}").unwrap()
});

/// Extract variable names in order of first appearance, duplicates kept.
#[inline]
pub fn extract_variables(text: &str) -> Vec<String> {
    VARIABLE_PATTERN
        .captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Distinct variable names, first-seen order preserved.
#[inline]
pub fn distinct_variables(variables: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for var in variables {
        if !seen.contains(var) {
            seen.push(var.clone());
        }
    }
    seen
}

/// Count non-blank segments after splitting on sentence-terminal punctuation.
#[inline]
pub fn count_sentences(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Structural and heuristic analysis of one message text. Never persisted by
/// the core; persistence belongs to the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Character count in Unicode scalar values, not bytes.
    pub length: usize,
    pub length_appropriate: bool,
    /// Occurrence-ordered variable names including repeats.
    pub variables: Vec<String>,
    /// Distinct variable names, first-seen order.
    pub distinct_variables: Vec<String>,
    /// Distinct-name count; the checklist bounds apply to this.
    pub variable_count: usize,
    /// Raw occurrence count; the policy 40-variable ceiling applies to this.
    pub occurrence_count: usize,
    pub has_greeting: bool,
    pub has_politeness: bool,
    pub potential_ad_content: bool,
    pub has_contact_info: bool,
    pub sentence_count: usize,
    pub compliance_score: f64,
}

/// Pure rule-driven validator. Keyword sets and thresholds come from
/// configuration so the heuristics can follow the corpus, not the code.
#[derive(Debug, Clone)]
pub struct ComplianceValidator {
    keywords: KeywordConfig,
    rules: RuleConfig,
}

impl ComplianceValidator {
    #[inline]
    pub fn new(config: &Config) -> Self {
        Self {
            keywords: config.keywords.clone(),
            rules: config.rules.clone(),
        }
    }

    #[inline]
    pub fn from_parts(keywords: KeywordConfig, rules: RuleConfig) -> Self {
        Self { keywords, rules }
    }

    #[inline]
    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    #[inline]
    pub fn keywords(&self) -> &KeywordConfig {
        &self.keywords
    }

    /// Analyze `text` and compute the generation-time compliance score.
    #[inline]
    pub fn validate(&self, text: &str) -> ValidationResult {
        let length = text.chars().count();
        let variables = extract_variables(text);
        let distinct = distinct_variables(&variables);

        let mut result = ValidationResult {
            length,
            length_appropriate: (self.rules.min_length..=self.rules.max_length).contains(&length),
            occurrence_count: variables.len(),
            variable_count: distinct.len(),
            variables,
            distinct_variables: distinct,
            has_greeting: contains_any(text, &self.keywords.greeting),
            has_politeness: contains_any(text, &self.keywords.politeness),
            potential_ad_content: contains_any(text, &self.keywords.advertising),
            has_contact_info: contains_any(text, &self.keywords.contact),
            sentence_count: count_sentences(text),
            compliance_score: 0.0,
        };

        result.compliance_score = checklist_score(&result, &self.rules);
        result
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|kw| text.contains(kw.as_str()))
}

/// Generation-time scoring strategy: a seven-item checklist, scored as
/// points earned over points possible, scaled to [0, 100].
#[inline]
pub fn checklist_score(result: &ValidationResult, rules: &RuleConfig) -> f64 {
    const MAX_SCORE: f64 = 7.0;

    let mut score = 0u32;

    if result.length_appropriate {
        score += 1;
    }
    if result.has_greeting {
        score += 1;
    }
    if result.has_politeness {
        score += 1;
    }
    if !result.potential_ad_content {
        score += 1;
    }
    if result.variable_count <= rules.max_checklist_variables {
        score += 1;
    }
    if result.variable_count >= 1 {
        score += 1;
    }
    if (rules.min_sentences..=rules.max_sentences).contains(&result.sentence_count) {
        score += 1;
    }

    (f64::from(score) / MAX_SCORE) * 100.0
}
