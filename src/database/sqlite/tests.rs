use super::*;
use std::collections::HashSet;
use tempfile::TempDir;

async fn create_test_database() -> Result<(TempDir, Database)> {
    let temp_dir = TempDir::new()?;
    let database = Database::initialize_from_config_dir(temp_dir.path()).await?;
    Ok((temp_dir, database))
}

#[tokio::test]
async fn integration_schema_migration() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )
    .fetch_all(database.pool())
    .await?;

    let expected: HashSet<&'static str> =
        ["sessions", "query_records", "token_usage", "_sqlx_migrations"]
            .into_iter()
            .collect();

    let actual: HashSet<&str> = tables.iter().map(|t| t.as_str()).collect();
    assert_eq!(actual, expected);

    Ok(())
}

#[tokio::test]
async fn integration_foreign_key_constraints() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    let result = database
        .record_query(models::NewQueryRecord {
            session_id: "missing-session".to_string(),
            request_text: "요청".to_string(),
            generated_template: None,
            compliance_score: None,
        })
        .await;

    assert!(result.is_err(), "Orphan query records must be rejected");
    Ok(())
}

#[tokio::test]
async fn integration_session_usage_flow() -> Result<()> {
    let (_temp_dir, database) = create_test_database().await?;

    database.touch_session("session-1").await?;
    database
        .record_usage(models::NewTokenUsage {
            session_id: "session-1".to_string(),
            model_name: "llama3.1:8b".to_string(),
            request_type: "generation".to_string(),
            prompt_tokens: 800,
            completion_tokens: 150,
            total_cost: 0.00021,
            processing_time_ms: 1200,
        })
        .await?;

    let summary = database
        .session_usage_summary("session-1")
        .await?
        .expect("Summary should exist");
    assert_eq!(summary.total_tokens, 950);

    let total = database.total_usage_cost().await?;
    assert!((total - 0.00021).abs() < 1e-9);

    Ok(())
}
