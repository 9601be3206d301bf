//! Policy-level audit of message text.
//!
//! This is the stricter enforcement layer with its own thresholds: the
//! 1,000-character ceiling and 40-variable ceiling are business rules and
//! independent of the generation-time length window in the base validator.

use serde::{Deserialize, Serialize};

use super::{distinct_variables, extract_variables};
use crate::config::{KeywordConfig, RuleConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    LengthViolation,
    VariableCountViolation,
    VariableFormatViolation,
    ContentAdvertisingViolation,
    ContentIllegalViolation,
    ContentHarmfulViolation,
    PersonalInfoViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuditSummary {
    pub total_violations: usize,
    pub critical_violations: usize,
    pub warning_violations: usize,
}

/// Result of the policy audit. `compliance_score` here uses the
/// penalty-subtraction strategy, not the generation-time checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAudit {
    pub character_count: usize,
    pub variable_occurrences: usize,
    pub excess_characters: usize,
    pub excess_variables: usize,
    pub invalid_variables: Vec<String>,
    pub violations: Vec<Violation>,
    pub suggestions: Vec<String>,
    pub summary: AuditSummary,
    pub compliance_score: f64,
    pub passed: bool,
}

#[derive(Debug, Clone)]
pub struct PolicyAuditor {
    keywords: KeywordConfig,
    rules: RuleConfig,
}

impl PolicyAuditor {
    #[inline]
    pub fn new(keywords: KeywordConfig, rules: RuleConfig) -> Self {
        Self { keywords, rules }
    }

    /// Run every policy check over `text` and aggregate violations,
    /// suggestions, and the penalty-based score.
    #[inline]
    pub fn audit(&self, text: &str) -> PolicyAudit {
        let character_count = text.chars().count();
        let variables = extract_variables(text);
        let occurrences = variables.len();

        let mut violations = Vec::new();
        let mut suggestions = Vec::new();

        // Length ceiling
        let excess_characters = character_count.saturating_sub(self.rules.policy_max_characters);
        if excess_characters > 0 {
            violations.push(Violation {
                kind: ViolationKind::LengthViolation,
                severity: Severity::Critical,
                message: format!(
                    "메시지가 {}자 제한을 초과했습니다 (현재: {}자)",
                    self.rules.policy_max_characters, character_count
                ),
                details: Some(format!("초과: {}자", excess_characters)),
            });
            suggestions.push("메시지 길이를 줄여주세요.".to_string());
        }

        // Variable ceiling applies to raw occurrences
        let excess_variables = occurrences.saturating_sub(self.rules.policy_max_variables);
        if excess_variables > 0 {
            violations.push(Violation {
                kind: ViolationKind::VariableCountViolation,
                severity: Severity::Critical,
                message: format!(
                    "변수가 {}개 제한을 초과했습니다 (현재: {}개)",
                    self.rules.policy_max_variables, occurrences
                ),
                details: Some(format!("초과: {}개", excess_variables)),
            });
            suggestions.push("변수 개수를 줄이거나 통합해주세요.".to_string());
        }

        // Variable naming rules apply to distinct names
        let invalid_variables: Vec<String> = distinct_variables(&variables)
            .into_iter()
            .filter(|name| !self.is_valid_variable_name(name))
            .collect();
        if !invalid_variables.is_empty() {
            violations.push(Violation {
                kind: ViolationKind::VariableFormatViolation,
                severity: Severity::Warning,
                message: "변수명은 영문, 숫자, 언더스코어만 사용할 수 있습니다 (최대 50자)"
                    .to_string(),
                details: Some(format!("잘못된 변수명: {}", invalid_variables.join(", "))),
            });
            suggestions.push("변수명을 영문, 숫자, 언더스코어 조합으로 수정해주세요.".to_string());
        }

        // Forbidden-content categories
        let content_checks = [
            (
                ViolationKind::ContentAdvertisingViolation,
                &self.keywords.forbidden_advertising,
                "광고성",
            ),
            (
                ViolationKind::ContentIllegalViolation,
                &self.keywords.forbidden_illegal,
                "불법",
            ),
            (
                ViolationKind::ContentHarmfulViolation,
                &self.keywords.forbidden_harmful,
                "유해",
            ),
            (
                ViolationKind::PersonalInfoViolation,
                &self.keywords.personal_info,
                "개인정보",
            ),
        ];

        for (kind, keywords, label) in content_checks {
            let found: Vec<&str> = keywords
                .iter()
                .filter(|kw| text.contains(kw.as_str()))
                .map(String::as_str)
                .collect();

            if !found.is_empty() {
                violations.push(Violation {
                    kind,
                    severity: Severity::Critical,
                    message: format!("{} 관련 금지 키워드가 발견되었습니다", label),
                    details: Some(format!("발견된 키워드: {}", found.join(", "))),
                });
                suggestions.push(format!(
                    "{} 키워드를 제거하거나 대체하세요.",
                    found.join(", ")
                ));
            }
        }

        let summary = AuditSummary {
            total_violations: violations.len(),
            critical_violations: violations
                .iter()
                .filter(|v| v.severity == Severity::Critical)
                .count(),
            warning_violations: violations
                .iter()
                .filter(|v| v.severity == Severity::Warning)
                .count(),
        };

        let compliance_score = penalty_score(&violations);
        let passed = summary.critical_violations == 0;

        PolicyAudit {
            character_count,
            variable_occurrences: occurrences,
            excess_characters,
            excess_variables,
            invalid_variables,
            violations,
            suggestions,
            summary,
            compliance_score,
            passed,
        }
    }

    /// A variable name is valid iff it matches `^[A-Za-z0-9_]+$` and is at
    /// most 50 characters long.
    #[inline]
    pub fn is_valid_variable_name(&self, name: &str) -> bool {
        !name.is_empty()
            && name.chars().count() <= self.rules.max_variable_name_length
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Business-vertical specific warnings layered on top of the audit.
    #[inline]
    pub fn business_warnings(&self, text: &str, business_type: &str) -> Vec<String> {
        let mut warnings = Vec::new();

        if (business_type.contains("금융") || business_type.contains("은행"))
            && (text.contains("계좌") || text.contains("카드"))
        {
            warnings.push("금융 관련 메시지에서는 개인정보 보호에 특히 주의하세요.".to_string());
        }

        if (business_type.contains("의료") || business_type.contains("병원"))
            && (text.contains("진료") || text.contains("처방"))
        {
            warnings.push("의료 관련 메시지는 의료광고 규정을 준수해야 합니다.".to_string());
        }

        if (business_type.contains("교육") || business_type.contains("학원"))
            && (text.contains("할인") || text.contains("무료"))
        {
            warnings.push("교육 서비스 관련 광고성 표현을 확인해주세요.".to_string());
        }

        warnings
    }
}

/// Policy-audit scoring strategy: start at 100 and subtract a fixed penalty
/// per violation (25 per critical, 10 per warning), floored at 0.
#[inline]
pub fn penalty_score(violations: &[Violation]) -> f64 {
    let mut score: f64 = 100.0;

    for violation in violations {
        score -= match violation.severity {
            Severity::Critical => 25.0,
            Severity::Warning => 10.0,
        };
    }

    score.max(0.0)
}
