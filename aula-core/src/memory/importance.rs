use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// Caller-assigned importance weight clamped to [0.0, 1.0].
/// Drives hot-tier promotion and eviction scoring.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Importance(f64);

impl Importance {
    /// Validating constructor: non-finite input is rejected before any I/O.
    pub fn try_new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteImportance { value });
        }
        Ok(Self(value.clamp(0.0, 1.0)))
    }

    /// Clamping constructor for values already known to be finite.
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Importance {
    fn default() -> Self {
        Self(0.5)
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<Importance> for f64 {
    fn from(i: Importance) -> Self {
        i.0
    }
}
