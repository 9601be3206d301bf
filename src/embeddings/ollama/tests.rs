use super::*;

#[test]
fn client_configuration() {
    let mut config = Config::default();
    config.ollama.host = "test-host".to_string();
    config.ollama.port = 1234;
    config.ollama.embedding_model = "test-model".to_string();
    config.ollama.batch_size = 128;

    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = Config::default();
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn dimension_comes_from_config() {
    let mut config = Config::default();
    config.ollama.embedding_dimension = 1024;

    let client = OllamaClient::new(&config).expect("Failed to create client");
    assert_eq!(client.dimension(), 1024);
}

#[test]
fn empty_batch_short_circuits() {
    let config = Config::default();
    let client = OllamaClient::new(&config).expect("Failed to create client");

    // No texts means no HTTP request at all
    let results = client
        .generate_embeddings_batch(&[])
        .expect("empty batch should succeed");
    assert!(results.is_empty());
}
