//! Error taxonomy for the Aula engine.
//!
//! Per-domain enums live in their own files; `AulaError` unifies them.
//! Consistency warnings are deliberately NOT errors — they are emitted as
//! `tracing::warn!` events by the components that detect them.

mod embedding_error;
mod storage_error;
mod validation_error;

pub use embedding_error::EmbeddingError;
pub use storage_error::StorageError;
pub use validation_error::ValidationError;

/// Convenience alias used across the workspace.
pub type AulaResult<T> = Result<T, AulaError>;

/// Top-level error for all Aula operations.
#[derive(Debug, thiserror::Error)]
pub enum AulaError {
    /// Caller input rejected before any I/O. Always recoverable by
    /// correcting the input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Embedding provider failure. The operation is aborted; callers may
    /// retry with backoff — the core never auto-retries.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Durable read/write failure. The hot tier is guaranteed untouched
    /// for writes by the durable-write-then-promote ordering.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The background persistence queue is full. Low-priority work is
    /// rejected rather than blocking the caller indefinitely.
    #[error("persistence queue saturated: {pending} items pending")]
    QueueSaturated { pending: usize },

    /// The background persistence queue has shut down and no longer
    /// accepts work.
    #[error("persistence queue is shut down")]
    QueueClosed,
}
