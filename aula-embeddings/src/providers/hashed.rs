//! Feature-hashed bag-of-words provider.
//!
//! Produces fixed-dimension dense vectors by hashing accent-folded terms
//! into signed buckets and weighting by term frequency. Not as rich as a
//! neural encoder, but deterministic and always available — identical text
//! always embeds to the identical vector.

use std::collections::HashMap;

use aula_core::errors::AulaResult;
use aula_core::traits::IEmbeddingProvider;

/// Deterministic hashed bag-of-words embedding provider.
pub struct HashedBowProvider {
    dimensions: usize,
}

impl HashedBowProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Fold Spanish diacritics so "dónde" and "donde" share a bucket.
    fn fold_char(c: char) -> char {
        match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            _ => c,
        }
    }

    /// Tokenize into lowercase accent-folded terms of length >= 2.
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .chars()
            .map(Self::fold_char)
            .collect::<String>()
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|s| s.len() >= 2)
            .map(|s| s.to_string())
            .collect()
    }

    /// Two independent bucket/sign pairs per term, derived from blake3.
    /// Spreading each term over two signed buckets keeps hash collisions
    /// from systematically inflating similarity.
    fn term_buckets(term: &str, dims: usize) -> [(usize, f32); 2] {
        let hash = blake3::hash(term.as_bytes());
        let bytes = hash.as_bytes();
        let h1 = u64::from_le_bytes(bytes[0..8].try_into().expect("hash is 32 bytes"));
        let h2 = u64::from_le_bytes(bytes[8..16].try_into().expect("hash is 32 bytes"));
        let sign1 = if bytes[16] & 1 == 0 { 1.0 } else { -1.0 };
        let sign2 = if bytes[17] & 1 == 0 { 1.0 } else { -1.0 };
        [
            ((h1 as usize) % dims, sign1),
            ((h2 as usize) % dims, sign2),
        ]
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; self.dimensions];
        }

        let mut tf: HashMap<&str, f32> = HashMap::new();
        for tok in &tokens {
            *tf.entry(tok.as_str()).or_default() += 1.0;
        }

        let total = tokens.len() as f32;
        let mut vec = vec![0.0f32; self.dimensions];
        for (term, count) in &tf {
            let freq = count / total;
            // Longer terms carry more signal than glue words.
            let weight = 1.0 + (term.len() as f32).ln();
            for (bucket, sign) in Self::term_buckets(term, self.dimensions) {
                vec[bucket] += sign * freq * weight;
            }
        }

        // L2 normalize.
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl IEmbeddingProvider for HashedBowProvider {
    fn embed(&self, text: &str) -> AulaResult<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashed-bow"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[test]
    fn deterministic_and_unit_norm() {
        let p = HashedBowProvider::new(256);
        let a = p.embed("horario de biblioteca").unwrap();
        let b = p.embed("horario de biblioteca").unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let p = HashedBowProvider::new(128);
        let v = p.embed("¡¿?!").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn accent_folding_aligns_variants() {
        let p = HashedBowProvider::new(256);
        let a = p.embed("dónde está la biblioteca").unwrap();
        let b = p.embed("donde esta la biblioteca").unwrap();
        assert!(cosine_similarity(&a, &b) > 0.999);
    }

    #[test]
    fn related_texts_beat_unrelated() {
        let p = HashedBowProvider::new(256);
        let a = p.embed("Horario biblioteca: 8-21h").unwrap();
        let b = p.embed("horario de biblioteca").unwrap();
        let c = p.embed("menu cafeteria campus sur").unwrap();
        let sim_ab = cosine_similarity(&a, &b);
        let sim_ac = cosine_similarity(&a, &c);
        assert!(sim_ab > 0.7, "expected overlap > 0.7, got {sim_ab}");
        assert!(sim_ab > sim_ac);
    }
}
