//! EmbeddingEngine — the main entry point for aula-embeddings.
//!
//! Wraps a provider with an in-process cache and a bounded concurrency
//! gate. Providers are CPU-bound, so calls run on the blocking pool behind
//! `min(cores, max_concurrency)` semaphore permits.

use std::sync::Arc;

use moka::sync::Cache;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use aula_core::config::EmbeddingConfig;
use aula_core::errors::{AulaResult, EmbeddingError, StorageError};
use aula_core::traits::IEmbeddingProvider;

/// The main embedding engine.
///
/// Implements caching and concurrency limiting around any
/// `IEmbeddingProvider`. Identical text always yields the identical vector
/// within a process lifetime, so cached and fresh results are
/// interchangeable.
pub struct EmbeddingEngine {
    provider: Arc<dyn IEmbeddingProvider>,
    cache: Cache<String, Arc<Vec<f32>>>,
    limiter: Arc<Semaphore>,
    dimensions: usize,
}

impl EmbeddingEngine {
    /// Create an engine with the default in-tree provider.
    pub fn new(config: &EmbeddingConfig) -> Self {
        let provider: Arc<dyn IEmbeddingProvider> =
            Arc::from(crate::providers::create_provider(config));
        Self::with_provider(config, provider)
    }

    /// Create an engine around an injected provider.
    pub fn with_provider(config: &EmbeddingConfig, provider: Arc<dyn IEmbeddingProvider>) -> Self {
        let permits = config
            .max_concurrency
            .min(std::thread::available_parallelism().map_or(4, |n| n.get()))
            .max(1);
        info!(
            provider = provider.name(),
            dims = provider.dimensions(),
            permits,
            "embedding engine initialized"
        );
        Self {
            dimensions: provider.dimensions(),
            cache: Cache::new(config.cache_size),
            limiter: Arc::new(Semaphore::new(permits)),
            provider,
        }
    }

    /// Fixed process-wide embedding dimension.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed a text through the cache and the bounded worker pool.
    pub async fn embed(&self, text: &str) -> AulaResult<Vec<f32>> {
        let key = blake3::hash(text.as_bytes()).to_hex().to_string();
        if let Some(cached) = self.cache.get(&key) {
            debug!(hash = %key, "embedding cache hit");
            return Ok(cached.as_ref().clone());
        }

        if !self.provider.is_available() {
            return Err(EmbeddingError::ProviderUnavailable {
                provider: self.provider.name().to_string(),
            }
            .into());
        }

        let _permit = self
            .limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| StorageError::TaskJoin {
                reason: e.to_string(),
            })?;

        let provider = Arc::clone(&self.provider);
        let owned = text.to_string();
        let embedding = tokio::task::spawn_blocking(move || provider.embed(&owned))
            .await
            .map_err(|e| StorageError::TaskJoin {
                reason: e.to_string(),
            })??;

        if embedding.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            }
            .into());
        }

        self.cache.insert(key, Arc::new(embedding.clone()));
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_core::config::EmbeddingConfig;

    #[tokio::test]
    async fn cache_returns_identical_vector() {
        let engine = EmbeddingEngine::new(&EmbeddingConfig::default());
        let a = engine.embed("matricula de posgrado").await.unwrap();
        let b = engine.embed("matricula de posgrado").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), engine.dimensions());
    }

    #[tokio::test]
    async fn unavailable_provider_is_an_embedding_error() {
        struct DownProvider;
        impl aula_core::traits::IEmbeddingProvider for DownProvider {
            fn embed(&self, _text: &str) -> AulaResult<Vec<f32>> {
                unreachable!("engine must check availability first")
            }
            fn dimensions(&self) -> usize {
                8
            }
            fn name(&self) -> &str {
                "down"
            }
            fn is_available(&self) -> bool {
                false
            }
        }

        let cfg = EmbeddingConfig {
            dimensions: 8,
            ..Default::default()
        };
        let engine = EmbeddingEngine::with_provider(&cfg, Arc::new(DownProvider));
        let err = engine.embed("anything").await.unwrap_err();
        assert!(matches!(
            err,
            aula_core::AulaError::Embedding(EmbeddingError::ProviderUnavailable { .. })
        ));
    }
}
