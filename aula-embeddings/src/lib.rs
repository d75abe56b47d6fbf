//! # aula-embeddings
//!
//! Embedding engine for the Aula memory system: provider trait
//! implementations, an in-process cache, a bounded concurrency gate for
//! CPU-bound providers, and the binary vector codec used by the durable
//! store.

pub mod codec;
pub mod engine;
pub mod providers;
pub mod similarity;

pub use engine::EmbeddingEngine;
pub use similarity::cosine_similarity;
