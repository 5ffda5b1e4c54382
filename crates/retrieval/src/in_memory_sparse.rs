//! In-memory `SparseIndex` reference implementation over the `bm25` crate
//!. Intended for tests and standalone development; a real
//! deployment plugs in whatever BM25-backed store the indexer populates.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bm25::{Embedder, EmbedderBuilder};
use hybridsearch_core::error::Result;
use hybridsearch_core::model::{Chunk, RetrieverResult};
use hybridsearch_core::path_util;
use hybridsearch_core::traits::{RetrieverFilters, SparseIndex};

use crate::code_tokenizer::CodeTokenizer;

struct StoreIndex {
    embedder: Embedder<u32, CodeTokenizer>,
    entries: Vec<(Chunk, Vec<(u32, f32)>)>,
}

/// An in-process BM25 index keyed by store name, built once over a fixed
/// corpus of chunks. Each chunk's content and symbols are embedded with the
/// same tokenizer used to index, so index-time and query-time vocabularies
/// agree.
pub struct InMemorySparseIndex {
    stores: RwLock<HashMap<String, StoreIndex>>,
}

impl Default for InMemorySparseIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySparseIndex {
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Indexes a fixed set of chunks for a store, replacing any existing
    /// index for that store name.
    pub fn index_store(&self, store: &str, chunks: Vec<Chunk>) {
        let avgdl = if chunks.is_empty() {
            1.0
        } else {
            chunks.iter().map(|c| c.content.split_whitespace().count()).sum::<usize>() as f32
                / chunks.len() as f32
        };
        let embedder = EmbedderBuilder::with_avgdl(avgdl.max(1.0))
            .tokenizer(CodeTokenizer::new())
            .build();

        let entries = chunks
            .into_iter()
            .map(|chunk| {
                let text = format!("{} {}", chunk.content, chunk.symbols.join(" "));
                let embedding = embedder.embed(&text);
                let sparse_vec: Vec<(u32, f32)> =
                    embedding.iter().map(|te| (te.index, te.value)).collect();
                (chunk, sparse_vec)
            })
            .collect();

        self.stores.write().unwrap_or_else(|e| e.into_inner()).insert(
            store.to_string(),
            StoreIndex { embedder, entries },
        );
    }
}

fn dot_product(a: &[(u32, f32)], b: &[(u32, f32)]) -> f32 {
    let mut b_map: HashMap<u32, f32> = HashMap::with_capacity(b.len());
    for (idx, val) in b {
        b_map.insert(*idx, *val);
    }
    a.iter()
        .filter_map(|(idx, val)| b_map.get(idx).map(|v| v * val))
        .sum()
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
impl SparseIndex for InMemorySparseIndex {
    async fn search(
        &self,
        store: &str,
        query: &str,
        top_k: usize,
        filters: &RetrieverFilters,
    ) -> Result<Vec<RetrieverResult>> {
        if top_k == 0 {
            return Ok(vec![]);
        }

        let stores = self.stores.read().unwrap_or_else(|e| e.into_inner());
        let Some(index) = stores.get(store) else {
            return Ok(vec![]);
        };

        let query_embedding = index.embedder.embed(query);
        let query_vec: Vec<(u32, f32)> = query_embedding.iter().map(|te| (te.index, te.value)).collect();

        let mut scored: Vec<(f32, &Chunk)> = index
            .entries
            .iter()
            .filter(|(chunk, _)| matches_filters(chunk, filters))
            .map(|(chunk, vec)| (dot_product(&query_vec, vec), chunk))
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
