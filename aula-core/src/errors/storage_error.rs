/// Storage-layer errors for durable store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("corrupt embedding blob: {details}")]
    CorruptEmbedding { details: String },

    #[error("background task join failed: {reason}")]
    TaskJoin { reason: String },
}
