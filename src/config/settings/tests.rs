use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.embedding_model, "nomic-embed-text:latest");
    assert_eq!(config.ollama.batch_size, 16);
    assert_eq!(config.rules.min_length, 50);
    assert_eq!(config.rules.max_length, 300);
    assert_eq!(config.rules.policy_max_characters, 1000);
    assert_eq!(config.rules.policy_max_variables, 40);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.embedding_model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 1001;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.rules.min_length = 500;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.rules.policy_max_characters = 100;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.keywords.greeting.clear();
    assert!(invalid_config.validate().is_err());
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_round_trip() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let mut parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    parsed_config.base_dir = config.base_dir.clone();
    assert_eq!(config, parsed_config);
}

#[test]
fn load_missing_config_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load_from(temp_dir.path()).expect("should load defaults");
    assert_eq!(config.base_dir, temp_dir.path());
    assert_eq!(config.ollama.port, 11434);
    assert!(!config.keywords.greeting.is_empty());
}

#[test]
fn save_and_reload() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let mut config = Config::load_from(temp_dir.path()).expect("should load defaults");
    config.ollama.host = "example.com".to_string();
    config.rules.max_checklist_variables = 12;
    config.save().expect("should save config");

    let reloaded = Config::load_from(temp_dir.path()).expect("should reload config");
    assert_eq!(reloaded.ollama.host, "example.com");
    assert_eq!(reloaded.rules.max_checklist_variables, 12);
}

#[test]
fn default_keyword_tables_cover_heuristics() {
    let keywords = KeywordConfig::default();
    assert!(keywords.greeting.iter().any(|k| k == "안녕하세요"));
    assert!(keywords.advertising.iter().any(|k| k == "할인"));
    assert!(keywords.forbidden_advertising.iter().any(|k| k == "쿠폰"));
    assert!(keywords.personal_info.iter().any(|k| k == "계좌번호"));
}
