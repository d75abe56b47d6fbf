use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence score clamped to [0.0, 1.0].
/// Represents how much the system trusts a memory or concept.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    /// High confidence threshold — entries above this are considered reliable.
    pub const HIGH: f64 = 0.8;
    /// Low confidence threshold — entries below this may need review.
    pub const LOW: f64 = 0.3;

    /// Create a new Confidence, clamping to [0.0, 1.0].
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw f64 value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Reinforce by `feedback_score × 0.1`, saturating at 1.0.
    ///
    /// Reinforcement is the only mutation path: feedback never lowers a
    /// confidence value.
    pub fn reinforce(self, feedback_score: f64) -> Self {
        Self::new(self.0 + feedback_score.max(0.0) * 0.1)
    }

    pub fn is_high(self) -> bool {
        self.0 >= Self::HIGH
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}
