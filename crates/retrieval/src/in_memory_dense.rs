//! In-memory `DenseIndex` reference implementation: brute-force cosine
//! similarity over a fixed corpus. Suitable for tests; a real
//! deployment plugs in an ANN index such as Qdrant.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use hybridsearch_core::error::Result;
use hybridsearch_core::model::{Chunk, RetrieverResult};
use hybridsearch_core::path_util;
use hybridsearch_core::traits::{DenseIndex, RetrieverFilters};

pub struct InMemoryDenseIndex {
    stores: RwLock<HashMap<String, Vec<(Chunk, Vec<f32>)>>>,
}

impl Default for InMemoryDenseIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDenseIndex {
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
        }
    }

    pub fn index_store(&self, store: &str, entries: Vec<(Chunk, Vec<f32>)>) {
        self.stores
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(store.to_string(), entries);
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn matches_filters(chunk: &Chunk, filters: &RetrieverFilters) -> bool {
    if let Some(prefix) = &filters.path_prefix {
        if !path_util::starts_with_prefix(&chunk.path, prefix) {
            return false;
        }
    }
    if let Some(language) = &filters.language {
        if chunk.language.to_lowercase() != language.to_lowercase() {
            return false;
        }
    }
    true
}

#[async_trait]
impl DenseIndex for InMemoryDenseIndex {
    async fn search(
        &self,
        store: &str,
        query_embedding: &[f32],
        top_k: usize,
        filters: &RetrieverFilters,
    ) -> Result<Vec<RetrieverResult>> {
        if top_k == 0 {
            return Ok(vec![]);
        }

        let stores = self.stores.read().unwrap_or_else(|e| e.into_inner());
        let Some(entries) = stores.get(store) else {
            return Ok(vec![]);
        };

        let mut scored: Vec<(f32, &Chunk)> = entries
            .iter()
            .filter(|(chunk, _)| matches_filters(chunk, filters))
            .map(|(chunk, vec)| (cosine_similarity(query_embedding, vec), chunk))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.doc_id.cmp(&b.1.doc_id))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(i, (score, chunk))| RetrieverResult {
                doc_id: chunk.doc_id.clone(),
                score,
                rank: (i + 1) as u32,
                chunk: chunk.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc_id: &str) -> Chunk {
        Chunk {
            doc_id: doc_id.to_string(),
            store: "default".to_string(),
            path: format!("{doc_id}.rs"),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 10,
            content: "content".to_string(),
            symbols: vec![],
        }
    }

    #[tokio::test]
    async fn zero_top_k_is_skipped() {
        let index = InMemoryDenseIndex::new();
        let result = index
            .search("s", &[1.0, 0.0], 0, &RetrieverFilters::default())
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn ranks_by_cosine_similarity_descending() {
        let index = InMemoryDenseIndex::new();
        index.index_store(
            "s",
            vec![
                (chunk("close"), vec![1.0, 0.0]),
                (chunk("far"), vec![0.0, 1.0]),
                (chunk("exact"), vec![2.0, 0.0]),
            ],
        );
        let result = index
            .search("s", &[1.0, 0.0], 10, &RetrieverFilters::default())
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert!(result[0].score >= result[1].score);
    }
}
