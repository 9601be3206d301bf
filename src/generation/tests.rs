use super::*;
use crate::config::KeywordConfig;
use crate::database::lancedb::ChunkMetadata;

fn validator() -> ComplianceValidator {
    ComplianceValidator::from_parts(KeywordConfig::default(), RuleConfig::default())
}

fn hit(content: &str, variables: &[&str], category: Option<&str>) -> RetrievalHit {
    RetrievalHit {
        chunk: ChunkMetadata {
            chunk_id: "chunk-1".to_string(),
            source_id: "tpl-1".to_string(),
            document_type: "approved_template".to_string(),
            category: category.map(ToString::to_string),
            business_type: None,
            content: content.to_string(),
            variables: variables.iter().map(|v| (*v).to_string()).collect(),
            button: Some("자세히 확인하기".to_string()),
            char_count: content.chars().count() as u32,
            created_at: "2026-08-01T00:00:00Z".to_string(),
        },
        score: 0.9,
    }
}

const COMPLIANT_TEXT: &str = "안녕하세요 #{고객명}님. 주문하신 상품이 준비되었습니다. \
잠시만 기다려 주세요. 문의가 있으시면 고객센터로 연락 바랍니다.";

#[test]
fn phase_labels() {
    assert_eq!(GenerationPhase::RetrievingContext.as_str(), "retrieving_context");
    assert_eq!(GenerationPhase::Complete.as_str(), "complete");
}

#[test]
fn compliant_template_earns_praise() {
    let validation = validator().validate(COMPLIANT_TEXT);
    assert!((validation.compliance_score - 100.0).abs() < f64::EPSILON);

    let suggestions = build_suggestions(&validation, &[], &RuleConfig::default());
    assert!(
        suggestions
            .iter()
            .any(|s| s.contains("훌륭합니다")),
        "high scores get the praise remark: {:?}",
        suggestions
    );
    assert!(!suggestions.iter().any(|s| s.contains("광고성 표현")));
}

#[test]
fn short_promotional_template_collects_structural_suggestions() {
    let validation = validator().validate("지금 특가 할인 이벤트!");
    let suggestions = build_suggestions(&validation, &[], &RuleConfig::default());

    assert!(suggestions.iter().any(|s| s.contains("너무 짧습니다")));
    assert!(suggestions.iter().any(|s| s.contains("인사말")));
    assert!(suggestions.iter().any(|s| s.contains("최소 1개 이상의 변수")));
    assert!(suggestions.iter().any(|s| s.contains("정중한 표현")));
    assert!(suggestions.iter().any(|s| s.contains("광고성 표현")));
    assert!(suggestions.iter().any(|s| s.contains("정책 준수도가 낮습니다")));
}

#[test]
fn overlong_template_suggests_trimming() {
    let body = "안내 말씀 드립니다. ".repeat(20);
    let validation = validator().validate(&body);
    let suggestions = build_suggestions(&validation, &[], &RuleConfig::default());

    assert!(suggestions.iter().any(|s| s.contains("너무 깁니다")));
}

#[test]
fn missing_common_variables_are_suggested_in_first_seen_order() {
    let validation = validator().validate(COMPLIANT_TEXT);
    let exemplars = vec![
        hit("예시 1", &["고객명", "주문번호", "배송일"], None),
        hit("예시 2", &["수령인", "매장명"], None),
    ];

    let suggestions = build_suggestions(&validation, &exemplars, &RuleConfig::default());
    let variable_suggestion = suggestions
        .iter()
        .find(|s| s.contains("자주 사용되는 변수"))
        .expect("missing-variable suggestion expected");

    // 고객명 is already used; the first three unused follow corpus order.
    assert!(variable_suggestion.contains("#{주문번호}"));
    assert!(variable_suggestion.contains("#{배송일}"));
    assert!(variable_suggestion.contains("#{수령인}"));
    assert!(!variable_suggestion.contains("#{고객명}"));
    assert!(!variable_suggestion.contains("#{매장명}"));
}

#[test]
fn generation_prompt_carries_request_and_defaults() {
    let request = GenerationRequest::new("session-1", "주문 완료 안내 메시지를 만들어주세요");
    let prompt = prompt::generation_prompt(&request, &[], &[], &[], &RuleConfig::default());

    assert!(prompt.contains("사용자 요청: 주문 완료 안내 메시지를 만들어주세요"));
    assert!(prompt.contains("권장 길이: 80-150자"));
    assert!(prompt.contains("업무분류: 일반"));
    assert!(!prompt.contains("승인받은 유사 템플릿 예시"));
    assert!(!prompt.contains("준수해야 할 정책"));
}

#[test]
fn generation_prompt_includes_context_sections() {
    let mut request = GenerationRequest::new("session-1", "배송 안내");
    request.target_length = Some(120);
    request.include_variables = vec!["고객명".to_string(), "주문번호".to_string()];
    request.business_type = Some("전자상거래".to_string());
    request.category_1 = Some("주문/배송".to_string());

    let exemplars = vec![hit(
        "#{고객명}님의 상품이 발송되었습니다.",
        &["고객명"],
        Some("주문/배송"),
    )];
    let patterns = vec![hit(
        "카테고리: 주문/배송\n템플릿 수: 3개\n\n주요 변수:\n- 고객명: 3\n- 주문번호: 2\n\n특징적 단어:\n없음",
        &["고객명", "주문번호"],
        Some("주문/배송"),
    )];
    let policies = vec![hit("정보성 메시지만 발송할 수 있습니다.", &[], None)];

    let prompt =
        prompt::generation_prompt(&request, &exemplars, &patterns, &policies, &RuleConfig::default());

    assert!(prompt.contains("목표 길이: 120자 내외"));
    assert!(prompt.contains("필수 포함 변수: #{고객명}, #{주문번호}"));
    assert!(prompt.contains("업무분류: 전자상거래"));
    assert!(prompt.contains("예시 1:"));
    assert!(prompt.contains("#{고객명}님의 상품이 발송되었습니다."));
    assert!(prompt.contains("카테고리 '주문/배송' 패턴 정보:"));
    assert!(prompt.contains("- 일반적 변수: #{고객명}, #{주문번호}"));
    assert!(prompt.contains("- 정보성 메시지만 발송할 수 있습니다."));
}

#[test]
fn optimization_prompt_reports_current_state() {
    let validation = validator().validate("지금 특가 할인 이벤트!");
    let prompt = prompt::optimization_prompt(
        "지금 특가 할인 이벤트!",
        &validation,
        &["광고성 표현 제거".to_string()],
    );

    assert!(prompt.contains("원본 템플릿:\n지금 특가 할인 이벤트!"));
    assert!(prompt.contains(&format!("길이: {}자", validation.length)));
    assert!(prompt.contains("변수 개수: 0개"));
    assert!(prompt.contains("특히 다음 사항을 개선해주세요: 광고성 표현 제거"));
}

#[test]
fn improvement_deltas_are_signed() {
    let v = validator();
    let before = v.validate("지금 특가 할인 이벤트!");
    let after = v.validate(COMPLIANT_TEXT);

    let improvement = Improvement {
        compliance_score_change: after.compliance_score - before.compliance_score,
        length_change: after.length as i64 - before.length as i64,
        variable_count_change: after.variable_count as i64 - before.variable_count as i64,
    };

    assert!(improvement.compliance_score_change > 0.0);
    assert!(improvement.length_change > 0);
    assert_eq!(improvement.variable_count_change, 1);
}
