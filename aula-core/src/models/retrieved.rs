use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::memory::{ContextType, EntryDetails};

/// A weakly-linked neighbor attached to a recall result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedEntry {
    pub id: String,
    pub content: String,
    pub category: String,
}

/// A ranked result returned to downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedEntry {
    pub id: String,
    pub content: String,
    pub context_type: ContextType,
    pub category: String,
    /// Cosine similarity between query and entry embeddings.
    pub similarity: f64,
    /// Hybrid (semantic + lexical) score; equals `similarity` until the
    /// ranker has run.
    pub score: f64,
    pub details: EntryDetails,
    pub extra: BTreeMap<String, String>,
    pub related: Vec<RelatedEntry>,
}
