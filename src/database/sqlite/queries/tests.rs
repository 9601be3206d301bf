use super::*;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

async fn create_test_pool() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(&db_path)
                .create_if_missing(true)
                .foreign_keys(true),
        )
        .await
        .expect("Failed to create test pool");

    sqlx::raw_sql(include_str!("../migrations/20260801000000_initial_schema.sql"))
        .execute(&pool)
        .await
        .expect("Failed to run migrations");

    (temp_dir, pool)
}

#[tokio::test]
async fn session_touch_is_idempotent() {
    let (_temp_dir, pool) = create_test_pool().await;

    let first = SessionQueries::touch(&pool, "session-1")
        .await
        .expect("Failed to create session");
    let second = SessionQueries::touch(&pool, "session-1")
        .await
        .expect("Failed to touch session");

    assert_eq!(first.id, second.id);
    assert_eq!(first.created_date, second.created_date);
    assert!(second.last_active >= first.last_active);

    let count = SessionQueries::count(&pool)
        .await
        .expect("Failed to count sessions");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn query_record_crud() {
    let (_temp_dir, pool) = create_test_pool().await;
    SessionQueries::touch(&pool, "session-1")
        .await
        .expect("Failed to create session");

    let created = QueryRecordQueries::create(
        &pool,
        NewQueryRecord {
            session_id: "session-1".to_string(),
            request_text: "주문 완료 안내".to_string(),
            generated_template: Some("#{고객명}님, 주문이 완료되었습니다.".to_string()),
            compliance_score: Some(85.7),
        },
    )
    .await
    .expect("Failed to create query record");

    assert_eq!(created.session_id, "session-1");
    assert_eq!(created.compliance_score, Some(85.7));

    let records = QueryRecordQueries::get_by_session(&pool, "session-1", 10)
        .await
        .expect("Failed to list query records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, created.id);
}

#[tokio::test]
async fn query_records_ordered_newest_first() {
    let (_temp_dir, pool) = create_test_pool().await;
    SessionQueries::touch(&pool, "session-1")
        .await
        .expect("Failed to create session");

    for i in 0..3 {
        QueryRecordQueries::create(
            &pool,
            NewQueryRecord {
                session_id: "session-1".to_string(),
                request_text: format!("요청 {}", i),
                generated_template: None,
                compliance_score: None,
            },
        )
        .await
        .expect("Failed to create query record");
    }

    let records = QueryRecordQueries::get_by_session(&pool, "session-1", 2)
        .await
        .expect("Failed to list query records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].request_text, "요청 2");
    assert_eq!(records[1].request_text, "요청 1");
}

#[tokio::test]
async fn token_usage_summary_aggregates() {
    let (_temp_dir, pool) = create_test_pool().await;
    SessionQueries::touch(&pool, "session-1")
        .await
        .expect("Failed to create session");

    for (prompt, completion, cost) in [(1000_i64, 200_i64, 0.00027), (500, 100, 0.000135)] {
        TokenUsageQueries::create(
            &pool,
            NewTokenUsage {
                session_id: "session-1".to_string(),
                model_name: "llama3.1:8b".to_string(),
                request_type: "generation".to_string(),
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_cost: cost,
                processing_time_ms: 1500,
            },
        )
        .await
        .expect("Failed to record usage");
    }

    let summary = TokenUsageQueries::summarize_session(&pool, "session-1")
        .await
        .expect("Failed to summarize usage")
        .expect("Summary should exist");

    assert_eq!(summary.request_count, 2);
    assert_eq!(summary.total_prompt_tokens, 1500);
    assert_eq!(summary.total_completion_tokens, 300);
    assert_eq!(summary.total_tokens, 1800);
    assert!((summary.total_cost - 0.000405).abs() < 1e-9);

    let missing = TokenUsageQueries::summarize_session(&pool, "session-2")
        .await
        .expect("Failed to summarize usage");
    assert!(missing.is_none());
}
