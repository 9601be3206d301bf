//! Similarity search over one chunk collection.
//!
//! Filters are exact-match and applied after the vector search: the store
//! is over-queried, filtered, then truncated to the requested limit. This
//! keeps filter semantics independent of the index implementation.


use crate::MsgForgeError;
use crate::database::lancedb::{
    ChunkMetadata, DocumentType, EmbeddingRecord, SearchResult, VectorStore,
};
use crate::embeddings::Embedder;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How many extra candidates to pull from the index per requested result,
/// to leave room for post-filtering.
const OVERFETCH_FACTOR: usize = 2;

/// Exact-match metadata constraints on a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub document_type: Option<DocumentType>,
    pub category: Option<String>,
    pub business_type: Option<String>,
}

impl SearchFilters {
    #[inline]
    pub fn document_type(document_type: DocumentType) -> Self {
        Self {
            document_type: Some(document_type),
            ..Self::default()
        }
    }

    fn matches(&self, metadata: &ChunkMetadata) -> bool {
        let type_ok = self
            .document_type
            .is_none_or(|t| metadata.document_type == t.as_str());
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|c| metadata.category.as_deref() == Some(c));
        let business_ok = self
            .business_type
            .as_deref()
            .is_none_or(|b| metadata.business_type.as_deref() == Some(b));
        type_ok && category_ok && business_ok
    }
}

/// One retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct RetrievalHit {
    pub chunk: ChunkMetadata,
    pub score: f32,
}

/// A chunk about to be ingested, before embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChunk {
    pub source_id: String,
    pub document_type: DocumentType,
    pub category: Option<String>,
    pub business_type: Option<String>,
    pub content: String,
    /// Text to embed when it differs from `content`. Exemplars embed an
    /// enriched rendering while `content` keeps the raw message.
    pub embed_text: Option<String>,
    pub variables: Vec<String>,
    pub button: Option<String>,
}

/// Embedding-backed search and ingestion over one collection.
pub struct RetrievalService {
    store: VectorStore,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalService {
    #[inline]
    pub fn new(store: VectorStore, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    #[inline]
    pub fn collection(&self) -> &str {
        self.store.collection()
    }

    /// Number of chunks currently in the collection.
    #[inline]
    pub async fn count(&self) -> Result<u64, MsgForgeError> {
        self.store.count().await
    }

    /// Drop all chunks from the collection.
    #[inline]
    pub async fn reset(&mut self) -> Result<(), MsgForgeError> {
        self.store.reset().await
    }

    /// Embed the chunks and append them to the collection. The batch is
    /// embedded up front so a failed embedding call leaves the store
    /// untouched.
    pub async fn ingest(&mut self, chunks: Vec<NewChunk>) -> Result<usize, MsgForgeError> {
        if chunks.is_empty() {
            debug!("No chunks to ingest into '{}'", self.collection());
            return Ok(0);
        }

        let texts: Vec<String> = chunks
            .iter()
            .map(|c| c.embed_text.clone().unwrap_or_else(|| c.content.clone()))
            .collect();
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .map_err(|e| MsgForgeError::EmbeddingUnavailable(e.to_string()))?;

        if vectors.len() < chunks.len() {
            warn!(
                "Embedding batch for '{}' returned {} vectors for {} chunks; storing the embedded prefix only",
                self.collection(),
                vectors.len(),
                chunks.len()
            );
        }

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<EmbeddingRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                let chunk_id = Uuid::new_v4().to_string();
                let char_count = chunk.content.chars().count() as u32;
                EmbeddingRecord {
                    id: chunk_id.clone(),
                    vector,
                    metadata: ChunkMetadata {
                        chunk_id,
                        source_id: chunk.source_id,
                        document_type: chunk.document_type.as_str().to_string(),
                        category: chunk.category,
                        business_type: chunk.business_type,
                        content: chunk.content,
                        variables: chunk.variables,
                        button: chunk.button,
                        char_count,
                        created_at: created_at.clone(),
                    },
                }
            })
            .collect();

        let stored = records.len();
        self.store.store_embeddings_batch(records).await?;

        info!("Ingested {} chunks into '{}'", stored, self.collection());
        Ok(stored)
    }

    /// Search for the `limit` chunks most similar to `query`, restricted
    /// by `filters`. An empty collection yields an empty result set.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<RetrievalHit>, MsgForgeError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(query)
            .map_err(|e| MsgForgeError::EmbeddingUnavailable(e.to_string()))?;

        let candidates = self
            .store
            .search_similar(&query_vector, limit * OVERFETCH_FACTOR)
            .await?;

        let total = candidates.len();
        let hits: Vec<RetrievalHit> = candidates
            .into_iter()
            .filter(|result| filters.matches(&result.metadata))
            .take(limit)
            .map(|SearchResult { metadata, similarity_score, .. }| RetrievalHit {
                chunk: metadata,
                score: similarity_score,
            })
            .collect();

        if hits.len() < limit && total >= limit * OVERFETCH_FACTOR {
            warn!(
                "Post-filtering left {}/{} requested results in '{}'",
                hits.len(),
                limit,
                self.collection()
            );
        }

        debug!(
            "Search in '{}' returned {} hits (from {} candidates)",
            self.collection(),
            hits.len(),
            total
        );
        Ok(hits)
    }
}
