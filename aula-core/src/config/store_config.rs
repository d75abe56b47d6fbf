use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Tiered memory store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path; an in-memory database when unset.
    pub database_path: Option<PathBuf>,
    /// Maximum number of entries in the hot tier.
    pub hot_capacity: usize,
    /// Importance above which a stored entry is promoted even when the hot
    /// tier is full.
    pub hot_promotion_threshold: f64,
    /// Cosine similarity floor for hot-tier recall.
    pub recall_similarity_threshold: f64,
    /// Capacity of each background-queue priority channel.
    pub queue_capacity: usize,
    /// How long shutdown waits for the queue to drain.
    pub shutdown_drain_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            hot_capacity: defaults::DEFAULT_HOT_CAPACITY,
            hot_promotion_threshold: defaults::DEFAULT_HOT_PROMOTION_THRESHOLD,
            recall_similarity_threshold: defaults::DEFAULT_RECALL_SIMILARITY_THRESHOLD,
            queue_capacity: defaults::DEFAULT_QUEUE_CAPACITY,
            shutdown_drain_secs: defaults::DEFAULT_SHUTDOWN_DRAIN_SECS,
        }
    }
}
