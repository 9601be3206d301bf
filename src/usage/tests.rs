use super::*;
use tempfile::TempDir;

#[test]
fn default_pricing_matches_published_rates() {
    let pricing = ModelPricing::default();
    assert!((pricing.prompt_per_1k - 0.000_15).abs() < f64::EPSILON);
    assert!((pricing.completion_per_1k - 0.000_6).abs() < f64::EPSILON);
}

#[test]
fn cost_scales_per_thousand_tokens() {
    let pricing = ModelPricing::default();

    // 1000 prompt + 1000 completion tokens cost one unit of each rate.
    let cost = pricing.cost(1000, 1000);
    assert!((cost - 0.000_75).abs() < 1e-12);

    assert!((pricing.cost(0, 0) - 0.0).abs() < f64::EPSILON);
    assert!((pricing.cost(500, 0) - 0.000_075).abs() < 1e-12);
}

#[test]
fn request_type_labels() {
    assert_eq!(RequestType::Generation.as_str(), "generation");
    assert_eq!(RequestType::Optimization.as_str(), "optimization");
}

#[tokio::test]
async fn track_persists_usage_and_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let database = Database::initialize_from_config_dir(temp_dir.path())
        .await
        .expect("Failed to create database");
    let tracker = UsageTracker::new(database.clone());

    let completion = Completion {
        text: "생성된 템플릿".to_string(),
        model: "llama3.1:8b".to_string(),
        prompt_tokens: 1000,
        completion_tokens: 500,
    };

    let usage = tracker
        .track("session-1", RequestType::Generation, &completion, 1800)
        .await
        .expect("Failed to track usage");

    assert_eq!(usage.total_tokens, 1500);
    assert_eq!(usage.request_type, "generation");
    assert!((usage.total_cost - 0.000_45).abs() < 1e-12);

    let session = database
        .get_session("session-1")
        .await
        .expect("Failed to load session");
    assert!(session.is_some());

    let summary = tracker
        .session_summary("session-1")
        .await
        .expect("Failed to summarize")
        .expect("Summary should exist");
    assert_eq!(summary.request_count, 1);
    assert_eq!(summary.total_tokens, 1500);
}
