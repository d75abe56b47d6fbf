use crate::errors::AulaResult;

/// Embedding generation provider.
///
/// Providers must be deterministic for identical input within a process
/// lifetime; the recall pipeline depends on it.
pub trait IEmbeddingProvider: Send + Sync {
    /// Embed a single text, returning a vector of floats.
    fn embed(&self, text: &str) -> AulaResult<Vec<f32>>;

    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[String]) -> AulaResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider is currently available.
    fn is_available(&self) -> bool {
        true
    }
}
