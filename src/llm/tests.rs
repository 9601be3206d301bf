use super::*;

#[test]
fn client_uses_completion_model() {
    let mut config = Config::default();
    config.ollama.completion_model = "test-llm".to_string();

    let client = OllamaCompletionClient::new(&config).expect("Failed to create client");
    assert_eq!(client.model(), "test-llm");
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn builder_overrides_retries() {
    let config = Config::default();
    let client = OllamaCompletionClient::new(&config)
        .expect("Failed to create client")
        .with_retry_attempts(4);
    assert_eq!(client.retry_attempts, 4);
}

#[test]
fn completion_token_total() {
    let completion = Completion {
        text: "generated".to_string(),
        model: "m".to_string(),
        prompt_tokens: 120,
        completion_tokens: 45,
    };
    assert_eq!(completion.total_tokens(), 165);
}

#[test]
fn default_options() {
    let options = CompletionOptions::default();
    assert!((options.temperature - 0.3).abs() < f32::EPSILON);
    assert_eq!(options.max_tokens, 2000);
}
