//! Collaborator traits for the surrounding systems the core depends on but
//! does not own: the sparse/dense indexes, the embedding provider, the
//! cross-encoder reranker, and the store registry.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::model::RetrieverResult;

/// Filters applied by a retriever driver.
#[derive(Debug, Clone, Default)]
pub struct RetrieverFilters {
    /// `/`-normalized path prefix, matched against the chunk's path after
    /// canonicalizing separators on both sides.
    pub path_prefix: Option<String>,
    /// Exact lowercase match against the chunk's language.
    pub language: Option<String>,
}

/// A BM25 full-text index keyed by `doc_id`.
#[async_trait]
pub trait SparseIndex: Send + Sync {
    async fn search(
        &self,
        store: &str,
        query: &str,
        top_k: usize,
        filters: &RetrieverFilters,
    ) -> Result<Vec<RetrieverResult>>;
}

/// An approximate-nearest-neighbor vector index keyed by `doc_id`.
#[async_trait]
pub trait DenseIndex: Send + Sync {
    async fn search(
        &self,
        store: &str,
        query_embedding: &[f32],
        top_k: usize,
        filters: &RetrieverFilters,
    ) -> Result<Vec<RetrieverResult>>;
}

/// Turns text into dense query vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Stable identifier mixed into the embedding cache key so that swapping
    /// models invalidates stale cache entries.
    fn model_id(&self) -> &str;
}

/// Scores `(query, document)` pairs with a cross-encoder.
#[async_trait]
pub trait RerankerProvider: Send + Sync {
    /// Scores all provided documents against the query and returns
    /// `(doc_id, score)` pairs, unsorted. The caller sorts and truncates.
    async fn rerank(&self, query: &str, documents: &[(String, &str)]) -> Result<Vec<(String, f32)>>;
}

/// Maps store name to existence / config; supports versioning.
pub trait StoreRegistry: Send + Sync {
    fn exists(&self, store: &str) -> bool;
}

/// A trivial `StoreRegistry` over a fixed set of known store names, suitable
/// for embedding directly into a long-lived `Config`.
#[derive(Debug, Clone, Default)]
pub struct StaticStoreRegistry {
    stores: HashMap<String, ()>,
}

impl StaticStoreRegistry {
    pub fn new(stores: impl IntoIterator<Item = String>) -> Self {
        Self {
            stores: stores.into_iter().map(|s| (s, ())).collect(),
        }
    }
}

impl StoreRegistry for StaticStoreRegistry {
    fn exists(&self, store: &str) -> bool {
        self.stores.contains_key(store)
    }
}
