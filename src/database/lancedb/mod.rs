pub mod vector_store;

use serde::{Deserialize, Serialize};

pub use vector_store::{SearchResult, VectorStore};

/// Which collection a chunk belongs to semantically. Policy passages and
/// exemplar material live in separate tables, but exemplars and the mined
/// per-category patterns share one table distinguished by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Policy,
    ApprovedTemplate,
    CategoryPattern,
}

impl DocumentType {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::ApprovedTemplate => "approved_template",
            Self::CategoryPattern => "category_pattern",
        }
    }

    #[inline]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "policy" => Some(Self::Policy),
            "approved_template" => Some(Self::ApprovedTemplate),
            "category_pattern" => Some(Self::CategoryPattern),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata stored alongside each embedding. Chunks are immutable once
/// ingested; re-ingestion replaces them wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub chunk_id: String,
    pub source_id: String,
    pub document_type: String,
    pub category: Option<String>,
    pub business_type: Option<String>,
    /// The raw message text for exemplars; the rendered form for patterns.
    pub content: String,
    pub variables: Vec<String>,
    pub button: Option<String>,
    pub char_count: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// Variables are stored as a single delimited column in the vector table.
/// Unit separator cannot appear in a variable name, so the join is lossless.
pub(crate) const VARIABLE_DELIMITER: char = '\u{1f}';

pub(crate) fn join_variables(variables: &[String]) -> String {
    variables.join(&VARIABLE_DELIMITER.to_string())
}

pub(crate) fn split_variables(joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined
        .split(VARIABLE_DELIMITER)
        .map(ToString::to_string)
        .collect()
}
