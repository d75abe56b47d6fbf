/// Embedding provider errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider '{provider}' unavailable")]
    ProviderUnavailable { provider: String },

    #[error("embedding failed: {reason}")]
    Failed { reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
