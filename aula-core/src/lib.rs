//! # aula-core
//!
//! Foundation crate for the Aula memory engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod memory;
pub mod models;
pub mod query;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::AulaConfig;
pub use errors::{AulaError, AulaResult};
pub use memory::{Confidence, ContextType, EntryDetails, Importance, MemoryEntry};
pub use query::{QueryKind, QueryProfile};
