//! Keyword-scored business-vertical classification of message text.

use serde::{Deserialize, Serialize};

const BUSINESS_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "전자상거래",
        &["주문", "배송", "결제", "상품", "쇼핑", "구매", "판매"],
    ),
    (
        "금융",
        &["계좌", "카드", "대출", "투자", "보험", "은행", "금융"],
    ),
    (
        "의료",
        &["진료", "예약", "병원", "치료", "건강", "의료", "진단"],
    ),
    (
        "교육",
        &["수업", "강의", "학습", "교육", "학원", "과정", "시험"],
    ),
    (
        "여행",
        &["예약", "호텔", "항공", "여행", "숙박", "관광", "티켓"],
    ),
    (
        "음식",
        &["주문", "배달", "음식", "식당", "메뉴", "요리", "레스토랑"],
    ),
    (
        "부동산",
        &["매물", "임대", "부동산", "아파트", "매매", "전세", "월세"],
    ),
    (
        "IT/소프트웨어",
        &["서비스", "앱", "소프트웨어", "시스템", "플랫폼", "기술"],
    ),
    (
        "소매",
        &["매장", "판매", "상품", "고객", "서비스", "할인", "이벤트"],
    ),
    (
        "물류",
        &["배송", "운송", "물류", "택배", "배달", "창고", "운반"],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    fn from_score(confidence: f64) -> Self {
        if confidence >= 0.6 {
            Self::High
        } else if confidence >= 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessTypeSuggestion {
    pub business_type: String,
    pub confidence: f64,
    pub level: ConfidenceLevel,
    pub matched_keywords: Vec<String>,
}

/// Score each business vertical by matched keywords and return the top five
/// candidates, best first. Ties keep table order for determinism.
#[inline]
pub fn suggest_business_types(
    text: &str,
    user_description: Option<&str>,
) -> Vec<BusinessTypeSuggestion> {
    let mut haystack = text.to_string();
    if let Some(description) = user_description {
        haystack.push(' ');
        haystack.push_str(description);
    }

    let mut suggestions: Vec<BusinessTypeSuggestion> = BUSINESS_KEYWORDS
        .iter()
        .filter_map(|(business_type, keywords)| {
            let matched: Vec<String> = keywords
                .iter()
                .filter(|kw| haystack.contains(**kw))
                .map(|kw| (*kw).to_string())
                .collect();

            if matched.is_empty() {
                return None;
            }

            let confidence = (matched.len() as f64 / keywords.len() as f64).min(1.0);
            Some(BusinessTypeSuggestion {
                business_type: (*business_type).to_string(),
                confidence,
                level: ConfidenceLevel::from_score(confidence),
                matched_keywords: matched,
            })
        })
        .collect();

    // Stable sort keeps the table order for equal match counts
    suggestions.sort_by(|a, b| {
        b.matched_keywords
            .len()
            .cmp(&a.matched_keywords.len())
            .then_with(|| b.confidence.total_cmp(&a.confidence))
    });
    suggestions.truncate(5);
    suggestions
}
