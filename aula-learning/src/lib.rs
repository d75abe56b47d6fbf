//! # aula-learning
//!
//! Turns feedback signals into reinforcement instructions and long-lived
//! context patterns. The cardinal rule: feedback only ever reinforces —
//! negative signals tag interactions for review, they never lower a
//! confidence or an edge weight.

pub mod engine;
pub mod patterns;

pub use engine::{LearningEngine, LearningOutcome};
pub use patterns::{ContextPattern, PatternBook};
