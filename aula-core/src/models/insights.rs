use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A hole in the knowledge base worth a content-team follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KnowledgeGap {
    /// A concept users keep hitting that is barely connected to anything.
    IsolatedConcept {
        concept: String,
        degree: usize,
        access_count: u64,
    },
    /// A category with too few concepts relative to the whole graph.
    SparseCategory { category: String, node_count: usize },
}

/// Aggregate view over the store and the graph, for operators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryInsights {
    pub total_entries: usize,
    pub counts_by_category: HashMap<String, usize>,
    pub counts_by_context: HashMap<String, usize>,
    /// (entry id, access count), most accessed first.
    pub most_accessed: Vec<(String, u64)>,
    pub graph_density: f64,
    pub knowledge_gaps: Vec<KnowledgeGap>,
}
