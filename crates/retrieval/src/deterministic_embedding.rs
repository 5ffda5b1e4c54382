//! A deterministic, dependency-free `EmbeddingProvider` reference
//! implementation for tests and standalone development: hashes tokens into a
//! fixed-width vector instead of calling a model host.

use async_trait::async_trait;
use hybridsearch_core::error::Result;
use hybridsearch_core::traits::EmbeddingProvider;

const DIMENSIONS: usize = 64;

pub struct DeterministicEmbeddingProvider {
    model_id: String,
}

impl DeterministicEmbeddingProvider {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

impl Default for DeterministicEmbeddingProvider {
    fn default() -> Self {
        Self::new("deterministic-hash-v1")
    }
}

fn hash_token(token: &str) -> usize {
    let mut hash: u64 = 1469598103934665603;
    for byte in token.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    (hash % DIMENSIONS as u64) as usize
}

#[async_trait]
impl EmbeddingProvider for DeterministicEmbeddingProvider {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for token in text.split_whitespace() {
            vector[hash_token(&token.to_lowercase())] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
