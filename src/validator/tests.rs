use super::business::{ConfidenceLevel, suggest_business_types};
use super::policy::{PolicyAuditor, Severity, Violation, ViolationKind, penalty_score};
use super::*;

fn validator() -> ComplianceValidator {
    ComplianceValidator::from_parts(KeywordConfig::default(), RuleConfig::default())
}

fn auditor() -> PolicyAuditor {
    PolicyAuditor::new(KeywordConfig::default(), RuleConfig::default())
}

#[test]
fn order_ready_message() {
    let text = "안녕하세요 #{고객명}님, 주문하신 상품이 준비되었습니다. 아래 버튼을 클릭해 확인해 주세요.";
    let result = validator().validate(text);

    assert!(result.has_greeting);
    assert!(result.has_politeness);
    assert!(!result.potential_ad_content);
    assert_eq!(result.variables, vec!["고객명"]);
    assert_eq!(result.variable_count, 1);
    assert_eq!(result.length, text.chars().count());
    assert_eq!(
        result.length_appropriate,
        (50..=300).contains(&result.length)
    );
    assert_eq!(result.sentence_count, 2);
}

#[test]
fn promotional_text_is_flagged() {
    let result = validator().validate("할인 이벤트 무료 쿠폰");
    assert!(result.potential_ad_content);
}

#[test]
fn score_always_within_bounds() {
    let v = validator();
    let samples = [
        "",
        "안녕하세요",
        "#{a}#{b}#{c}#{d}#{e}#{f}#{g}#{h}#{i}#{j}#{k}#{l}",
        "할인! 무료! 이벤트! 쿠폰! 특가!",
        "주문이 완료되었습니다. 감사합니다.",
    ];

    for text in samples {
        let score = v.validate(text).compliance_score;
        assert!((0.0..=100.0).contains(&score), "score {} for {:?}", score, text);
    }
}

#[test]
fn no_variables_means_empty_list() {
    let result = validator().validate("변수 없는 일반 텍스트입니다.");
    assert_eq!(result.variable_count, 0);
    assert!(result.variables.is_empty());
    assert!(result.distinct_variables.is_empty());
}

#[test]
fn empty_text_validates_without_panic() {
    let result = validator().validate("");
    assert_eq!(result.length, 0);
    assert_eq!(result.variable_count, 0);
    assert!(!result.length_appropriate);
    assert_eq!(result.sentence_count, 0);
    assert!((0.0..=100.0).contains(&result.compliance_score));
}

#[test]
fn variables_only_text_has_zero_sentences() {
    let result = validator().validate("#{a}#{b}");
    assert_eq!(result.sentence_count, 0);
    assert!((0.0..=100.0).contains(&result.compliance_score));
}

#[test]
fn duplicate_variables_kept_in_occurrence_order() {
    let result = validator().validate("#{name}님, #{date}에 #{name}님의 예약이 확정되었습니다.");
    assert_eq!(result.variables, vec!["name", "date", "name"]);
    assert_eq!(result.occurrence_count, 3);
    assert_eq!(result.distinct_variables, vec!["name", "date"]);
    assert_eq!(result.variable_count, 2);
}

#[test]
fn unicode_length_counts_scalars_not_bytes() {
    let result = validator().validate("안녕");
    assert_eq!(result.length, 2);
}

#[test]
fn sentence_count_splits_on_terminal_punctuation() {
    assert_eq!(count_sentences("하나. 둘! 셋?"), 3);
    assert_eq!(count_sentences("마침표 없음"), 1);
    assert_eq!(count_sentences("... !!!"), 0);
}

#[test]
fn checklist_awards_seven_points() {
    // Satisfies every checklist item: length in window, greeting,
    // politeness, no ads, 1..=10 distinct variables, 2..=5 sentences.
    let text = "안녕하세요 #{고객성명}님, 예약하신 내역이 확인되었습니다. 자세한 내용은 아래에서 확인해 주세요. 감사합니다.";
    let result = validator().validate(text);
    assert!(result.length_appropriate, "length was {}", result.length);
    assert!((result.compliance_score - 100.0).abs() < f64::EPSILON);
}

#[test]
fn excess_variables_reported_at_policy_layer() {
    let text: String = (0..45).map(|i| format!("#{{var_{}}}", i)).collect();
    let audit = auditor().audit(&text);

    assert_eq!(audit.variable_occurrences, 45);
    assert_eq!(audit.excess_variables, 5);
    assert!(
        audit
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::VariableCountViolation
                && v.severity == Severity::Critical)
    );
    assert!(!audit.passed);
}

#[test]
fn invalid_variable_name_flagged() {
    let audit = auditor().audit("예약 안내: #{고객-이름}님의 자리가 준비되었습니다.");
    assert_eq!(audit.invalid_variables, vec!["고객-이름"]);
    assert!(
        audit
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::VariableFormatViolation
                && v.severity == Severity::Warning)
    );
}

#[test]
fn variable_name_validity_rules() {
    let a = auditor();
    assert!(a.is_valid_variable_name("customer_name"));
    assert!(a.is_valid_variable_name("order123"));
    assert!(!a.is_valid_variable_name("고객명"));
    assert!(!a.is_valid_variable_name("bad-name"));
    assert!(!a.is_valid_variable_name(""));
    assert!(!a.is_valid_variable_name(&"x".repeat(51)));
    assert!(a.is_valid_variable_name(&"x".repeat(50)));
}

#[test]
fn penalty_scoring_subtracts_per_violation() {
    let critical = Violation {
        kind: ViolationKind::LengthViolation,
        severity: Severity::Critical,
        message: String::new(),
        details: None,
    };
    let warning = Violation {
        kind: ViolationKind::VariableFormatViolation,
        severity: Severity::Warning,
        message: String::new(),
        details: None,
    };

    assert!((penalty_score(&[]) - 100.0).abs() < f64::EPSILON);
    assert!((penalty_score(&[critical.clone()]) - 75.0).abs() < f64::EPSILON);
    assert!((penalty_score(&[critical.clone(), warning]) - 65.0).abs() < f64::EPSILON);

    // Floors at zero rather than going negative
    let many = vec![critical; 6];
    assert!(penalty_score(&many).abs() < f64::EPSILON);
}

#[test]
fn scoring_strategies_disagree_by_design() {
    // Long promotional text: the policy audit fails hard while the
    // checklist still awards partial credit. The two must stay distinct.
    let text = "할인 쿠폰 안내. 무료 이벤트에 #{name}님을 초대합니다. 지금 확인하세요.";
    let checklist = validator().validate(text).compliance_score;
    let audit = auditor().audit(text);

    assert!(checklist > 0.0);
    assert!(audit.compliance_score < 100.0);
    assert!((checklist - audit.compliance_score).abs() > f64::EPSILON);
}

#[test]
fn forbidden_content_categories_detected() {
    let audit = auditor().audit("도박 관련 무료 쿠폰과 주민등록번호를 입력하세요");
    let kinds: Vec<ViolationKind> = audit.violations.iter().map(|v| v.kind).collect();

    assert!(kinds.contains(&ViolationKind::ContentAdvertisingViolation));
    assert!(kinds.contains(&ViolationKind::ContentIllegalViolation));
    assert!(kinds.contains(&ViolationKind::PersonalInfoViolation));
    assert!(audit.summary.critical_violations >= 3);
}

#[test]
fn business_specific_warnings() {
    let a = auditor();
    let finance = a.business_warnings("계좌 변경 안내입니다", "금융");
    assert_eq!(finance.len(), 1);

    let none = a.business_warnings("계좌 변경 안내입니다", "음식");
    assert!(none.is_empty());
}

#[test]
fn business_type_suggestion_ranks_by_matches() {
    let suggestions = suggest_business_types("주문하신 상품의 배송이 시작되었습니다. 결제 내역을 확인하세요.", None);
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].business_type, "전자상거래");
    assert!(suggestions.len() <= 5);
    for pair in suggestions.windows(2) {
        assert!(pair[0].matched_keywords.len() >= pair[1].matched_keywords.len());
    }
}

#[test]
fn business_type_suggestion_uses_description() {
    let with_desc = suggest_business_types("안내드립니다", Some("병원 진료 예약"));
    assert!(with_desc.iter().any(|s| s.business_type == "의료"));

    let without = suggest_business_types("안내드립니다", None);
    assert!(without.is_empty());
}

#[test]
fn confidence_levels_partition() {
    let suggestions = suggest_business_types(
        "주문 배송 결제 상품 쇼핑 구매 판매 안내",
        None,
    );
    assert_eq!(suggestions[0].level, ConfidenceLevel::High);
}
