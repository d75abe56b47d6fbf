use serde::{Deserialize, Serialize};

use super::defaults;

/// Adaptive learning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// EMA smoothing factor for pattern success rates.
    pub success_rate_alpha: f64,
    /// How many recent retrievals are kept for feedback attribution.
    pub interaction_window: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            success_rate_alpha: defaults::DEFAULT_SUCCESS_RATE_ALPHA,
            interaction_window: defaults::DEFAULT_INTERACTION_WINDOW,
        }
    }
}
