mod embedding;
mod storage;

pub use embedding::IEmbeddingProvider;
pub use storage::{CleanupCriteria, EntryFilter, FeedbackAudit, IDurableStore, StoreStats};
