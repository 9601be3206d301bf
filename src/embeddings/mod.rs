// Embeddings module
// Trait seam for the external embedding function plus the Ollama client

pub mod ollama;

use anyhow::Result;

pub use ollama::OllamaClient;

/// External embedding function: text in, fixed-length vector out.
///
/// Implementations must be deterministic for identical input within one
/// index's lifetime; switching models requires a full re-index, never an
/// incremental merge. The backend is selected explicitly at startup through
/// this interface, not discovered by fallback.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The fixed dimension D every vector from this embedder has.
    fn dimension(&self) -> usize;
}
