//! Retriever drivers (C4): the two concurrently-invoked operations that
//! call out to the sparse and dense indexes.

use std::sync::Arc;

use hybridsearch_core::error::{Error, Result};
use hybridsearch_core::model::RetrieverResult;
use hybridsearch_core::traits::{DenseIndex, EmbeddingProvider, RetrieverFilters, SparseIndex};
use tracing::warn;

/// Outcome of the dense leg, distinguishing "skipped, no embedding available"
/// from "ran and returned results" so the orchestrator can set the
/// `dense.skipped`/`skipReason` telemetry flag accurately.
pub struct DenseOutcome {
    pub results: Vec<RetrieverResult>,
    pub embedding_fallback: bool,
    pub cache_hit: bool,
}

/// `sparseSearch(store, query, topK, pathFilter?, languageFilter?) -> [RetrieverResult]`.
///
/// Skipped entirely when `top_k = 0`. `StoreNotFound` surfaces; any other
/// failure degrades to an empty result with a logged warning.
pub async fn sparse_search(
    index: &dyn SparseIndex,
    store: &str,
    query: &str,
    top_k: usize,
    filters: &RetrieverFilters,
) -> Result<Vec<RetrieverResult>> {
    if top_k == 0 {
        return Ok(vec![]);
    }

    match index.search(store, query, top_k, filters).await {
        Ok(results) => Ok(results.into_iter().take(top_k).collect()),
        Err(err @ Error::StoreNotFound(_)) => Err(err),
        Err(err) => {
            warn!(error = %err, store, "sparse retriever failed, degrading to empty result");
            Ok(vec![])
        }
    }
}

/// `denseSearch(store, queryEmbedding, topK, pathFilter?, languageFilter?) -> [RetrieverResult]`.
///
/// `queryEmbedding` is produced by the embedding provider on a best-effort
/// cache keyed by `fingerprint + modelId`, supplied by the caller so this
/// function stays free of any particular cache implementation. Skipped when
/// `top_k = 0` or the embedding fails (sparse-only fallback, flagged via
/// `DenseOutcome::embedding_fallback`).
pub async fn dense_search(
    index: &dyn DenseIndex,
    embedder: &dyn EmbeddingProvider,
    cached_embedding: Option<Vec<f32>>,
    query: &str,
    store: &str,
    top_k: usize,
    filters: &RetrieverFilters,
) -> Result<DenseOutcome> {
    if top_k == 0 {
        return Ok(DenseOutcome {
            results: vec![],
            embedding_fallback: false,
            cache_hit: false,
        });
    }

    let (embedding, cache_hit) = match cached_embedding {
        Some(embedding) => (Some(embedding), true),
        None => match embedder.embed_query(query).await {
            Ok(embedding) => (Some(embedding), false),
            Err(err) => {
                warn!(error = %err, store, "embedding provider failed, falling back to sparse-only");
                (None, false)
            }
        },
    };

    let Some(embedding) = embedding else {
        return Ok(DenseOutcome {
            results: vec![],
            embedding_fallback: true,
            cache_hit: false,
        });
    };

    match index.search(store, &embedding, top_k, filters).await {
        Ok(results) => Ok(DenseOutcome {
            results: results.into_iter().take(top_k).collect(),
            embedding_fallback: false,
            cache_hit,
        }),
        Err(err @ Error::StoreNotFound(_)) => Err(err),
        Err(err) => {
            warn!(error = %err, store, "dense retriever failed, degrading to empty result");
            Ok(DenseOutcome {
                results: vec![],
                embedding_fallback: false,
                cache_hit,
            })
        }
    }
}

/// Runs both retriever legs concurrently and waits for both to settle;
/// fusion is invoked only after both retrievers have settled.
pub async fn run_retrievers(
    sparse_index: Arc<dyn SparseIndex>,
    dense_index: Arc<dyn DenseIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    cached_embedding: Option<Vec<f32>>,
    query: &str,
    store: &str,
    sparse_top_k: usize,
    dense_top_k: usize,
    filters: RetrieverFilters,
) -> Result<(Vec<RetrieverResult>, DenseOutcome)> {
    let sparse_filters = filters.clone();
    let query_owned = query.to_string();
    let store_owned = store.to_string();
    let sparse_fut = async {
        sparse_search(
            sparse_index.as_ref(),
            &store_owned,
            &query_owned,
            sparse_top_k,
            &sparse_filters,
        )
        .await
    };

    let query_owned = query.to_string();
    let store_owned = store.to_string();
    let dense_fut = async {
        dense_search(
            dense_index.as_ref(),
            embedder.as_ref(),
            cached_embedding,
            &query_owned,
            &store_owned,
            dense_top_k,
            &filters,
        )
        .await
    };

    let (sparse_result, dense_result) = tokio::join!(sparse_fut, dense_fut);
    Ok((sparse_result?, dense_result?))
}
