//! Prompt assembly for generation and optimization.
//!
//! Pure string construction: retrieval context goes in, one prompt comes
//! out. Keeping this free of IO makes the prompts testable verbatim.

use crate::config::RuleConfig;
use crate::miner::parse_common_variables;
use crate::retrieval::RetrievalHit;
use crate::validator::ValidationResult;
use std::fmt::Write as _;

use super::GenerationRequest;

const EXEMPLAR_LIMIT: usize = 3;
const POLICY_LIMIT: usize = 3;

fn variable_placeholder(name: &str) -> String {
    format!("#{{{}}}", name)
}

fn exemplar_section(exemplars: &[RetrievalHit]) -> String {
    if exemplars.is_empty() {
        return String::new();
    }

    let mut section = String::from("\n\n승인받은 유사 템플릿 예시:\n");
    for (i, hit) in exemplars.iter().take(EXEMPLAR_LIMIT).enumerate() {
        let variables = hit
            .chunk
            .variables
            .iter()
            .map(|v| variable_placeholder(v))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            section,
            "\n예시 {}:\n- 텍스트: {}\n- 사용변수: {}\n- 버튼: {}\n",
            i + 1,
            hit.chunk.content,
            variables,
            hit.chunk.button.as_deref().unwrap_or("X")
        );
    }
    section
}

fn pattern_section(patterns: &[RetrievalHit]) -> String {
    let mut section = String::new();
    for hit in patterns {
        let category = hit.chunk.category.as_deref().unwrap_or("기타");
        let variables = parse_common_variables(&hit.chunk.content)
            .into_iter()
            .map(|(name, _)| variable_placeholder(&name))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            section,
            "\n카테고리 '{}' 패턴 정보:\n- 일반적 변수: {}\n- 패턴 요약:\n{}\n",
            category, variables, hit.chunk.content
        );
    }
    section
}

fn policy_section(policies: &[RetrievalHit]) -> String {
    if policies.is_empty() {
        return String::new();
    }

    let mut section = String::from("\n\n준수해야 할 정책:\n");
    for hit in policies.iter().take(POLICY_LIMIT) {
        let _ = writeln!(section, "- {}", hit.chunk.content);
    }
    section
}

/// Build the full generation prompt from the request and retrieved context.
pub fn generation_prompt(
    request: &GenerationRequest,
    exemplars: &[RetrievalHit],
    patterns: &[RetrievalHit],
    policies: &[RetrievalHit],
    rules: &RuleConfig,
) -> String {
    let length_requirement = match request.target_length {
        Some(target) => format!("\n목표 길이: {}자 내외", target),
        None => format!(
            "\n권장 길이: {}-{}자",
            rules.optimal_min_length, rules.optimal_max_length
        ),
    };

    let variable_requirements = if request.include_variables.is_empty() {
        String::new()
    } else {
        format!(
            "\n\n필수 포함 변수: {}",
            request
                .include_variables
                .iter()
                .map(|v| variable_placeholder(v))
                .collect::<Vec<_>>()
                .join(", ")
        )
    };

    format!(
        "당신은 알림 메시지 템플릿 생성 전문가입니다.\n\
         승인받은 템플릿들의 패턴을 분석하여 정책을 준수하는 새로운 템플릿을 생성합니다.\n\n\
         템플릿 생성 규칙:\n\
         1. 정보성 메시지만 가능 (광고성 내용 금지)\n\
         2. 변수는 #{{변수명}} 형태로 사용\n\
         3. 친근하고 정중한 톤앤매너\n\
         4. 명확하고 구체적인 정보 제공\n\
         5. 적절한 버튼 텍스트 제안\n\n\
         생성 시 고려사항:\n\
         - 업무분류: {}\n\
         - 1차분류: {}\n\
         - 2차분류: {}\
         {}{}{}{}{}\n\n\
         다음 요청에 맞는 알림 메시지 템플릿을 생성해주세요:\n\n\
         사용자 요청: {}\n\n\
         위의 승인받은 템플릿 패턴과 정책을 참고하여, 정책을 완벽히 준수하면서도 \
         사용자 요청에 맞는 템플릿을 생성해주세요.\n\n\
         응답 형식: 템플릿 텍스트만 생성해주세요. 추가 설명이나 주석은 포함하지 마세요.",
        request.business_type.as_deref().unwrap_or("일반"),
        request.category_1.as_deref().unwrap_or("서비스이용"),
        request.category_2.as_deref().unwrap_or("이용안내/정보"),
        length_requirement,
        variable_requirements,
        exemplar_section(exemplars),
        pattern_section(patterns),
        policy_section(policies),
        request.user_request
    )
}

/// Build the optimization prompt for an existing template.
pub fn optimization_prompt(
    template: &str,
    validation: &ValidationResult,
    target_improvements: &[String],
) -> String {
    let improvements_text = if target_improvements.is_empty() {
        String::new()
    } else {
        format!(
            "\n특히 다음 사항을 개선해주세요: {}",
            target_improvements.join(", ")
        )
    };

    format!(
        "당신은 알림 메시지 템플릿 최적화 전문가입니다.\n\
         주어진 템플릿을 정책에 더 적합하도록 개선하세요.\n\n\
         최적화 목표:\n\
         1. 정책 준수도 향상\n\
         2. 사용자 경험 개선\n\
         3. 승인 가능성 증대\n\
         4. 명확성과 친근함 균형\n\n\
         다음 템플릿을 최적화해주세요:\n\n\
         원본 템플릿:\n{}\n\n\
         현재 문제점:\n\
         - 길이: {}자\n\
         - 변수 개수: {}개\n\
         - 정책 준수도: {:.1}점\
         {}\n\n\
         응답 형식: 최적화된 템플릿 텍스트만 제공하세요.",
        template,
        validation.length,
        validation.variable_count,
        validation.compliance_score,
        improvements_text
    )
}
