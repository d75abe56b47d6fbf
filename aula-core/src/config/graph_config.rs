use serde::{Deserialize, Serialize};

use super::defaults;

/// Knowledge graph configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Cosine similarity required to create a semantic edge.
    pub edge_creation_threshold: f64,
    /// Looser cosine floor used when exploring at query time.
    pub exploration_threshold: f64,
    /// Cap on semantic edges per node.
    pub max_connections_per_node: usize,
    /// Access count above which a poorly-connected node counts as a gap.
    pub gap_access_floor: u64,
    /// A category below this fraction of total nodes counts as sparse.
    pub sparse_category_ratio: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            edge_creation_threshold: defaults::DEFAULT_EDGE_CREATION_THRESHOLD,
            exploration_threshold: defaults::DEFAULT_EXPLORATION_THRESHOLD,
            max_connections_per_node: defaults::DEFAULT_MAX_CONNECTIONS_PER_NODE,
            gap_access_floor: defaults::DEFAULT_GAP_ACCESS_FLOOR,
            sparse_category_ratio: defaults::DEFAULT_SPARSE_CATEGORY_RATIO,
        }
    }
}
