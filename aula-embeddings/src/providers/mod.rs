//! Embedding providers.
//!
//! The hashed bag-of-words provider is the in-tree default: deterministic,
//! dependency-free, good enough for keyword-heavy institutional content.
//! Deployments with a neural provider implement `IEmbeddingProvider` on
//! their side and inject it at service construction.

mod hashed;
mod scripted;

pub use hashed::HashedBowProvider;
pub use scripted::ScriptedProvider;

use aula_core::config::EmbeddingConfig;
use aula_core::traits::IEmbeddingProvider;

/// Create the default provider for the given config.
pub fn create_provider(config: &EmbeddingConfig) -> Box<dyn IEmbeddingProvider> {
    Box::new(HashedBowProvider::new(config.dimensions))
}
