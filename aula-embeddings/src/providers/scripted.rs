//! Scripted provider: preset vectors for specific texts, hashed fallback
//! for everything else. Lets integration tests pin exact similarities
//! (e.g. two concept names at cosine 0.9) without a neural backend.

use std::collections::HashMap;

use aula_core::errors::AulaResult;
use aula_core::traits::IEmbeddingProvider;

use super::hashed::HashedBowProvider;

pub struct ScriptedProvider {
    fallback: HashedBowProvider,
    scripted: HashMap<String, Vec<f32>>,
    dimensions: usize,
}

impl ScriptedProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            fallback: HashedBowProvider::new(dimensions),
            scripted: HashMap::new(),
            dimensions,
        }
    }

    /// Pin an exact vector for a text. The vector is used as-is; callers
    /// pick components to produce the pairwise cosines they need.
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        debug_assert_eq!(vector.len(), self.dimensions);
        self.scripted.insert(text.into(), vector);
        self
    }
}

impl IEmbeddingProvider for ScriptedProvider {
    fn embed(&self, text: &str) -> AulaResult<Vec<f32>> {
        if let Some(v) = self.scripted.get(text) {
            return Ok(v.clone());
        }
        self.fallback.embed(text)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
