//! Hybrid score fusion.
//!
//! `hybrid = w × semantic + (1 − w) × bm25_norm`, where BM25 scores are
//! normalized by the candidate set's maximum. The sort is stable, so equal
//! scores keep their incoming order and re-ranking a ranked list is a
//! no-op — output order is deterministic and testable.

use tracing::debug;

use aula_core::config::RetrievalConfig;
use aula_core::query::{QueryKind, QueryProfile};

use crate::bm25::{self, Bm25Params};
use crate::classify::QueryClassifier;

/// A candidate entering the ranker: id, raw text, semantic similarity.
#[derive(Debug, Clone)]
pub struct RankCandidate {
    pub id: String,
    pub content: String,
    pub semantic: f64,
}

/// A candidate after fusion.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub id: String,
    pub content: String,
    pub semantic: f64,
    pub bm25_norm: f64,
    pub hybrid: f64,
}

impl From<RankedCandidate> for RankCandidate {
    fn from(r: RankedCandidate) -> Self {
        Self {
            id: r.id,
            content: r.content,
            semantic: r.semantic,
        }
    }
}

pub struct HybridRanker {
    config: RetrievalConfig,
    classifier: QueryClassifier,
}

impl HybridRanker {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            config,
            classifier: QueryClassifier::new(),
        }
    }

    pub fn classify(&self, query: &str) -> QueryKind {
        self.classifier.classify(query)
    }

    /// Pure re-ranking: fuse scores over exactly the given candidates.
    ///
    /// No filtering, no truncation — both belong to [`rank_for_query`].
    /// An empty candidate list is an empty result, not an error.
    pub fn rerank(&self, query: &str, candidates: Vec<RankCandidate>) -> Vec<RankedCandidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let query_tokens = bm25::tokenize(query);
        // A query that dissolves into stopwords has no lexical signal:
        // skip BM25 and let the semantic half carry full weight.
        let semantic_weight = if query_tokens.is_empty() {
            1.0
        } else {
            self.config.semantic_weight
        };

        let documents: Vec<Vec<String>> = candidates
            .iter()
            .map(|c| bm25::tokenize(&c.content))
            .collect();
        let params = Bm25Params {
            k1: self.config.bm25_k1,
            b: self.config.bm25_b,
        };
        let raw = bm25::score_all(&query_tokens, &documents, params);
        let max = raw.iter().cloned().fold(0.0f64, f64::max);

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .zip(raw)
            .map(|(c, score)| {
                let bm25_norm = if max > 0.0 { score / max } else { 0.0 };
                RankedCandidate {
                    hybrid: semantic_weight * c.semantic + (1.0 - semantic_weight) * bm25_norm,
                    bm25_norm,
                    id: c.id,
                    content: c.content,
                    semantic: c.semantic,
                }
            })
            .collect();

        // Stable: ties keep candidate order.
        ranked.sort_by(|a, b| {
            b.hybrid
                .partial_cmp(&a.hybrid)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Full query path: classify, drop candidates under the kind's
    /// similarity threshold, fuse, and truncate to the kind's result count.
    pub fn rank_for_query(
        &self,
        query: &str,
        candidates: Vec<RankCandidate>,
    ) -> (QueryKind, Vec<RankedCandidate>) {
        let kind = self.classify(query);
        let QueryProfile {
            similarity_threshold,
            max_results,
        } = kind.profile();

        let survivors: Vec<RankCandidate> = candidates
            .into_iter()
            .filter(|c| c.semantic >= similarity_threshold)
            .collect();
        debug!(
            ?kind,
            threshold = similarity_threshold,
            survivors = survivors.len(),
            "adaptive threshold applied"
        );

        let mut ranked = self.rerank(query, survivors);
        ranked.truncate(max_results);
        (kind, ranked)
    }
}
