use thiserror::Error;

pub type Result<T> = std::result::Result<T, MsgForgeError>;

#[derive(Error, Debug)]
pub enum MsgForgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Ingestion failed: {0}")]
    Ingest(String),

    /// Non-fatal: the orchestrator logs this and continues with empty context.
    #[error("Retrieval degraded: {0}")]
    RetrievalDegraded(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    /// Indicates a logic defect in the validator, not a modeled failure.
    #[error("Internal validation error: {0}")]
    ValidationInternal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod generation;
pub mod llm;
pub mod miner;
pub mod retrieval;
pub mod session;
pub mod usage;
pub mod validator;
