use serde::{Deserialize, Serialize};

use super::defaults;

/// Hybrid ranker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Weight of the semantic half of the hybrid score; the lexical half
    /// gets `1 - semantic_weight`.
    pub semantic_weight: f64,
    pub bm25_k1: f64,
    pub bm25_b: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            semantic_weight: defaults::DEFAULT_SEMANTIC_WEIGHT,
            bm25_k1: defaults::DEFAULT_BM25_K1,
            bm25_b: defaults::DEFAULT_BM25_B,
        }
    }
}
