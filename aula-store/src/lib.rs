//! # aula-store
//!
//! The tiered memory store: a durable SQLite cold tier, an in-memory hot
//! tier behind a reader/writer lock, and a single-consumer background
//! queue that keeps low-priority mutations off the query path.

pub mod engine;
pub mod hot_tier;
pub mod queue;
pub mod sqlite;

pub use engine::{MemoryStore, RecallRequest, StoreRequest};
pub use hot_tier::HotTier;
pub use queue::{PersistTask, PersistenceQueue};
pub use sqlite::SqliteStore;
