use super::*;

#[test]
fn new_token_usage_totals() {
    let usage = NewTokenUsage {
        session_id: "session-1".to_string(),
        model_name: "llama3.1:8b".to_string(),
        request_type: "generation".to_string(),
        prompt_tokens: 1200,
        completion_tokens: 340,
        total_cost: 0.000384,
        processing_time_ms: 2100,
    };

    assert_eq!(usage.total_tokens(), 1540);
}

#[test]
fn query_record_serialization_round_trip() {
    let record = QueryRecord {
        id: 7,
        session_id: "session-1".to_string(),
        request_text: "주문 완료 안내 메시지".to_string(),
        generated_template: Some("#{고객명}님, 주문이 완료되었습니다.".to_string()),
        compliance_score: Some(85.7),
        created_date: chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
            .expect("valid date")
            .and_hms_opt(12, 0, 0)
            .expect("valid time"),
    };

    let json = serde_json::to_string(&record).expect("Failed to serialize");
    let parsed: QueryRecord = serde_json::from_str(&json).expect("Failed to deserialize");
    assert_eq!(parsed, record);
}
