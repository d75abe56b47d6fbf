//! # aula-retrieval
//!
//! The hybrid retrieval ranker: buckets a query into an adaptive profile,
//! scores candidates lexically with BM25 over the candidate set itself,
//! and fuses lexical and semantic signals into one deterministic ranking.

pub mod bm25;
pub mod classify;
pub mod ranker;

pub use classify::QueryClassifier;
pub use ranker::{HybridRanker, RankCandidate, RankedCandidate};
