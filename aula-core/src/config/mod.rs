//! Per-subsystem configuration, loadable from TOML.
//!
//! Every struct carries `#[serde(default)]` so a partial TOML file only
//! overrides what it names.

pub mod defaults;

mod embedding_config;
mod graph_config;
mod learning_config;
mod retrieval_config;
mod store_config;

pub use embedding_config::EmbeddingConfig;
pub use graph_config::GraphConfig;
pub use learning_config::LearningConfig;
pub use retrieval_config::RetrievalConfig;
pub use store_config::StoreConfig;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the whole engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AulaConfig {
    pub store: StoreConfig,
    pub graph: GraphConfig,
    pub retrieval: RetrievalConfig,
    pub learning: LearningConfig,
    pub embedding: EmbeddingConfig,
}

impl AulaConfig {
    /// Parse a TOML document, filling anything unspecified with defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg = AulaConfig::from_toml_str(
            r#"
            [store]
            hot_capacity = 7

            [retrieval]
            semantic_weight = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.store.hot_capacity, 7);
        assert!((cfg.retrieval.semantic_weight - 0.8).abs() < 1e-9);
        // Untouched sections keep their defaults.
        assert_eq!(
            cfg.graph.max_connections_per_node,
            defaults::DEFAULT_MAX_CONNECTIONS_PER_NODE
        );
    }
}
