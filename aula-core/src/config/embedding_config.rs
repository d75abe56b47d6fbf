use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Fixed process-wide vector dimension.
    pub dimensions: usize,
    /// Entry capacity of the in-process embedding cache.
    pub cache_size: u64,
    /// Upper bound on concurrent provider calls; the effective bound is
    /// `min(cores, max_concurrency)`.
    pub max_concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: defaults::DEFAULT_EMBEDDING_DIMENSIONS,
            cache_size: defaults::DEFAULT_EMBEDDING_CACHE_SIZE,
            max_concurrency: defaults::DEFAULT_MAX_CONCURRENT_EMBEDDINGS,
        }
    }
}
