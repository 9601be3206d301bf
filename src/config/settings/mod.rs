#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 768;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub embedding_model: String,
    pub completion_model: String,
    pub batch_size: u32,
    pub embedding_dimension: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            embedding_model: "nomic-embed-text:latest".to_string(),
            completion_model: "llama3.1:8b".to_string(),
            batch_size: 16,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

/// Keyword tables driving the heuristic checks. These are data, not code:
/// the validator never hardcodes them, so a different corpus or language can
/// swap them out through the config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeywordConfig {
    pub greeting: Vec<String>,
    pub politeness: Vec<String>,
    pub advertising: Vec<String>,
    pub contact: Vec<String>,
    pub button_mention: Vec<String>,
    /// Forbidden-content categories enforced at the policy layer.
    pub forbidden_advertising: Vec<String>,
    pub forbidden_illegal: Vec<String>,
    pub forbidden_harmful: Vec<String>,
    pub personal_info: Vec<String>,
    /// Generic terms excluded from characteristic-word mining.
    pub stopwords: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            greeting: owned(&["안녕하세요", "고객님", "회원님"]),
            politeness: owned(&["습니다", "하세요", "주세요", "바랍니다"]),
            advertising: owned(&["할인", "이벤트", "프로모션", "세일", "특가", "무료"]),
            contact: owned(&["연락", "문의", "전화"]),
            button_mention: owned(&["버튼", "클릭", "확인", "아래"]),
            forbidden_advertising: owned(&["광고", "홍보", "할인", "무료", "이벤트", "쿠폰"]),
            forbidden_illegal: owned(&["도박", "사행성", "불법"]),
            forbidden_harmful: owned(&["성인", "폭력", "혐오"]),
            personal_info: owned(&["주민등록번호", "여권번호", "신용카드번호", "계좌번호"]),
            stopwords: owned(&[
                "안녕하세요",
                "고객님",
                "님",
                "확인",
                "하실",
                "수",
                "있습니다",
                "바랍니다",
                "감사합니다",
                "이용",
                "서비스",
                "문의",
                "연락",
            ]),
        }
    }
}

/// Numeric thresholds for both scoring contexts. The generation-time window
/// (`min_length`/`max_length`) and the policy ceiling (`policy_max_characters`)
/// are different limits for different purposes and stay separate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuleConfig {
    pub min_length: usize,
    pub max_length: usize,
    /// Recommended band for generated messages, narrower than the hard
    /// length window.
    pub optimal_min_length: usize,
    pub optimal_max_length: usize,
    pub max_checklist_variables: usize,
    pub min_sentences: usize,
    pub max_sentences: usize,
    pub policy_max_characters: usize,
    pub policy_max_variables: usize,
    pub max_variable_name_length: usize,
    pub history_window: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_length: 50,
            max_length: 300,
            optimal_min_length: 80,
            optimal_max_length: 150,
            max_checklist_variables: 10,
            min_sentences: 2,
            max_sentences: 5,
            policy_max_characters: 1000,
            policy_max_variables: 40,
            max_variable_name_length: 50,
            history_window: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Length window minimum ({0}) must be less than maximum ({1})")]
    InvalidLengthWindow(usize, usize),
    #[error("Policy character ceiling ({0}) must be at least the length window maximum ({1})")]
    PolicyCeilingTooSmall(usize, usize),
    #[error("Sentence window minimum ({0}) must be at most maximum ({1})")]
    InvalidSentenceWindow(usize, usize),
    #[error("History window must be at least 1")]
    InvalidHistoryWindow,
    #[error("Keyword set '{0}' cannot be empty")]
    EmptyKeywordSet(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load the configuration from `config.toml` under `config_dir`, falling
    /// back to defaults when the file does not exist (first run starts cold).
    #[inline]
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                ollama: OllamaConfig::default(),
                keywords: KeywordConfig::default(),
                rules: RuleConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Load from the default configuration directory.
    #[inline]
    pub fn load() -> Result<Self> {
        let dir = Self::config_dir().context("Failed to resolve config directory")?;
        Self::load_from(dir)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|d| d.join("msgforge"))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    /// Path for the SQLite metadata database
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.get_base_dir().join("metadata.db")
    }

    /// Directory holding the LanceDB vector tables
    #[inline]
    pub fn vector_db_path(&self) -> PathBuf {
        self.get_base_dir().join("vectors")
    }

    #[inline]
    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!(
            "{}://{}:{}",
            self.ollama.protocol, self.ollama.host, self.ollama.port
        );
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ollama.validate()?;
        self.rules.validate()?;
        self.keywords.validate()?;
        Ok(())
    }
}

impl OllamaConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if !(1..=1000).contains(&self.batch_size) {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.completion_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.completion_model.clone()));
        }

        if !(64..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        Ok(())
    }
}

impl RuleConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_length >= self.max_length {
            return Err(ConfigError::InvalidLengthWindow(
                self.min_length,
                self.max_length,
            ));
        }

        if self.optimal_min_length >= self.optimal_max_length {
            return Err(ConfigError::InvalidLengthWindow(
                self.optimal_min_length,
                self.optimal_max_length,
            ));
        }

        if self.policy_max_characters < self.max_length {
            return Err(ConfigError::PolicyCeilingTooSmall(
                self.policy_max_characters,
                self.max_length,
            ));
        }

        if self.min_sentences > self.max_sentences {
            return Err(ConfigError::InvalidSentenceWindow(
                self.min_sentences,
                self.max_sentences,
            ));
        }

        if self.history_window == 0 {
            return Err(ConfigError::InvalidHistoryWindow);
        }

        Ok(())
    }
}

impl KeywordConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.greeting.is_empty() {
            return Err(ConfigError::EmptyKeywordSet("greeting"));
        }
        if self.politeness.is_empty() {
            return Err(ConfigError::EmptyKeywordSet("politeness"));
        }
        if self.advertising.is_empty() {
            return Err(ConfigError::EmptyKeywordSet("advertising"));
        }
        if self.contact.is_empty() {
            return Err(ConfigError::EmptyKeywordSet("contact"));
        }
        Ok(())
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            keywords: KeywordConfig::default(),
            rules: RuleConfig::default(),
            base_dir: Self::config_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}
