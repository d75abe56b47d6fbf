//! # aula
//!
//! The assembled engine behind an institutional question-answering
//! assistant: tiered memory recall, concept-graph expansion, hybrid
//! semantic + lexical ranking, and a feedback-driven learning loop.
//!
//! This crate is a library boundary — HTTP, auth, and response generation
//! live elsewhere. Construct one [`AulaService`] at process start, share
//! it by reference, and call [`AulaService::shutdown`] before exit so the
//! background queue drains.

mod service;

pub use service::{AulaService, RetrievalFilters};

// Re-export what downstream callers need without extra crate deps.
pub use aula_core::config::AulaConfig;
pub use aula_core::errors::{AulaError, AulaResult};
pub use aula_core::memory::{ContextType, EntryDetails, MemoryEntry};
pub use aula_core::models::{FeedbackEvent, KnowledgeGap, MemoryInsights, RetrievedEntry};
pub use aula_core::query::QueryKind;
pub use aula_learning::LearningOutcome;
pub use aula_store::{RecallRequest, StoreRequest};
