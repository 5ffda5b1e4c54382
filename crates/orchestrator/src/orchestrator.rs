//! Search orchestrator (C9): drives C1 through C8 in fixed order for one
//! request (query preprocessing, concurrent retrieval, RRF fusion,
//! conditional reranking, truncation, and a single response envelope).

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use hybridsearch_core::config::Config;
use hybridsearch_core::error::{Error, Result};
use hybridsearch_core::model::{
    CacheTelemetry, FusionTelemetry, LegStats, NormalizedQuery, RerankTelemetry, RetrievalConfig, TelemetryRecord,
    compute_score_stats,
};
use hybridsearch_core::traits::{DenseIndex, EmbeddingProvider, RerankerProvider, RetrieverFilters, SparseIndex, StoreRegistry};
use hybridsearch_fusion::{compute_fusion_stats, fuse, FuseOptions};
use hybridsearch_postrank::{resolve_postrank_config, run_postrank_pipeline, PostrankOptions, PostrankOverrides};
use hybridsearch_reranking::rerank_pipeline;
use hybridsearch_telemetry::TelemetryRecorder;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::request::{SearchRequest, SearchResponse};

/// Bundles every collaborator the orchestrator depends on but does not own.
pub struct Orchestrator {
    config: Config,
    sparse_index: Arc<dyn SparseIndex>,
    dense_index: Arc<dyn DenseIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    reranker: Arc<dyn RerankerProvider>,
    stores: Arc<dyn StoreRegistry>,
    telemetry: Arc<TelemetryRecorder>,
    /// Keyed by `{fingerprint}:{model_id}` so swapping embedding models
    /// can't serve a stale vector from an old one.
    embedding_cache: moka::sync::Cache<String, Vec<f32>>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        sparse_index: Arc<dyn SparseIndex>,
        dense_index: Arc<dyn DenseIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        reranker: Arc<dyn RerankerProvider>,
        stores: Arc<dyn StoreRegistry>,
        telemetry: Arc<TelemetryRecorder>,
    ) -> Self {
        let embedding_cache = moka::sync::Cache::new(config.cache.embedding_cache_capacity);
        Self {
            config,
            sparse_index,
            dense_index,
            embedder,
            reranker,
            stores,
            telemetry,
            embedding_cache,
        }
    }

    /// Runs one search end to end, enforcing the request deadline and
    /// propagating cancellation. Validation, not-found, and cancellation
    /// errors suppress telemetry; all other failures still
    /// abort the request but are not separately logged here, since the
    /// collaborator traits already degrade internally on soft failures.
    pub async fn search(&self, request: SearchRequest, cancellation: CancellationToken) -> Result<SearchResponse> {
        let request_id = Uuid::new_v4();
        let start = Instant::now();

        if !self.stores.exists(&request.store) {
            return Err(Error::store_not_found(request.store.clone()));
        }

        let top_k = request
            .top_k
            .unwrap_or(self.config.request.default_top_k)
            .min(self.config.request.max_top_k);
        if top_k == 0 {
            return Err(Error::invalid_top_k("top_k must be at least 1"));
        }

        let deadline = Duration::from_millis(self.config.request.request_deadline_ms);

        let outcome = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(Error::Cancelled),
            result = tokio::time::timeout(deadline, self.run_pipeline(&request, top_k, request_id)) => {
                match result {
                    Ok(inner) => inner,
                    Err(_) => Err(Error::internal("request deadline exceeded")),
                }
            }
        };

        match outcome {
            Ok((response, mut telemetry_record)) => {
                let total_latency_ms = start.elapsed().as_millis() as u64;
                telemetry_record.total_latency_ms = total_latency_ms;
                self.telemetry.record(telemetry_record);
                info!(
                    request_id = %request_id,
                    store = %request.store,
                    results = response.results.len(),
                    latency_ms = total_latency_ms,
                    "search completed"
                );
                Ok(SearchResponse {
                    request_id,
                    total_latency_ms,
                    ..response
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Resolves the query embedding through the cache before the dense leg
    /// runs, so a repeated query against the same model never re-embeds.
    /// Returns `None` (cache miss and not computed) only when dense
    /// retrieval is skipped outright or the embedder itself fails; either
    /// way `run_retrievers` degrades to sparse-only from there.
    async fn resolve_cached_embedding(
        &self,
        normalized: &NormalizedQuery,
        retrieval: &RetrievalConfig,
    ) -> (Option<Vec<f32>>, bool) {
        if retrieval.dense_top_k == 0 {
            return (None, false);
        }

        let cache_key = format!("{}:{}", normalized.fingerprint, self.embedder.model_id());
        if let Some(embedding) = self.embedding_cache.get(&cache_key) {
            return (Some(embedding), true);
        }

        match self.embedder.embed_query(&normalized.normalized).await {
            Ok(embedding) => {
                self.embedding_cache.insert(cache_key, embedding.clone());
                (Some(embedding), false)
            }
            Err(_) => (None, false),
        }
    }

    async fn run_pipeline(
        &self,
        request: &SearchRequest,
        top_k: usize,
        request_id: Uuid,
    ) -> Result<(SearchResponse, TelemetryRecord)> {
        let normalized = match hybridsearch_query::normalize(&request.query) {
            Ok(normalized) => normalized,
            Err(err) => return Err(err),
        };

        let classification = hybridsearch_query::classify(&normalized);
        let overrides = request.strategy_overrides.clone().unwrap_or_default();
        let retrieval = hybridsearch_query::resolve_strategy(
            &self.config.strategy,
            classification.intent,
            classification.difficulty,
            &overrides,
        );

        let filters = RetrieverFilters {
            path_prefix: request.path_prefix.clone(),
            language: request.language.clone(),
        };

        let (cached_embedding, embedding_cache_hit) =
            self.resolve_cached_embedding(&normalized, &retrieval).await;

        let sparse_start = Instant::now();
        let dense_start = Instant::now();
        let (sparse_results, dense_outcome) = hybridsearch_retrieval::run_retrievers(
            Arc::clone(&self.sparse_index),
            Arc::clone(&self.dense_index),
            Arc::clone(&self.embedder),
            cached_embedding,
            &normalized.normalized,
            &request.store,
            retrieval.sparse_top_k,
            retrieval.dense_top_k,
            filters,
        )
        .await?;
        let sparse_latency_ms = sparse_start.elapsed().as_millis() as u64;
        let dense_latency_ms = dense_start.elapsed().as_millis() as u64;

        let sparse_scores: Vec<f32> = sparse_results.iter().map(|r| r.score).collect();
        let dense_scores: Vec<f32> = dense_outcome.results.iter().map(|r| r.score).collect();
        let sparse_stats = compute_score_stats(&sparse_scores);
        let dense_stats = compute_score_stats(&dense_scores);

        let query_tokens: Vec<String> = normalized.normalized.split_whitespace().map(String::from).collect();
        let fuse_opts = FuseOptions {
            sparse_weight: retrieval.sparse_weight,
            dense_weight: retrieval.dense_weight,
            group_by_file: request.group_by_file,
        };
        let fused = fuse(&sparse_results, &dense_outcome.results, &query_tokens, &self.config.strategy, &fuse_opts);
        let fusion_stats = compute_fusion_stats(&fused);
        let fused_count = fused.len();

        let candidates: Vec<_> = fused.into_iter().take(retrieval.rerank_candidates.max(top_k)).collect();

        let (reranked, rerank_stats) = rerank_pipeline(
            self.reranker.as_ref(),
            &normalized.normalized,
            candidates,
            retrieval.rerank_candidates,
            retrieval.use_second_pass,
            retrieval.second_pass_candidates,
            &self.config.reranking,
        )
        .await;

        let postrank_overrides = PostrankOverrides {
            dedup_threshold: request.dedup_threshold,
            diversity_lambda: request.diversity_lambda,
            max_chunks_per_file: request.max_chunks_per_file,
        };
        let postrank_config = resolve_postrank_config(&self.config.postrank, &postrank_overrides);
        let postrank_options = PostrankOptions {
            enable_dedup: request.enable_dedup,
            enable_diversity: request.enable_diversity,
            group_by_file: request.group_by_file,
        };
        let postrank_outcome = run_postrank_pipeline(reranked, &postrank_config, &postrank_options);
        let mut results = postrank_outcome.results;
        results.truncate(top_k);

        if !request.include_content {
            for aggregated in results.iter_mut() {
                aggregated.result.content = None;
            }
        }

        let record = TelemetryRecord {
            request_id,
            timestamp: Utc::now().to_rfc3339(),
            store: request.store.clone(),
            query: normalized.raw.clone(),
            intent: classification.intent,
            strategy: retrieval.strategy,
            sparse: LegStats {
                count: sparse_results.len(),
                latency_ms: sparse_latency_ms,
                top_score: sparse_stats.p95.max(sparse_scores.first().copied().unwrap_or(0.0)),
                std_dev: sparse_stats.std_dev,
            },
            dense: LegStats {
                count: dense_outcome.results.len(),
                latency_ms: dense_latency_ms,
                top_score: dense_stats.p95.max(dense_scores.first().copied().unwrap_or(0.0)),
                std_dev: dense_stats.std_dev,
            },
            fusion: FusionTelemetry {
                count: fused_count,
                latency_ms: 0,
                top_score: fusion_stats.top_score,
                second_score: fusion_stats.second_score,
                score_gap: fusion_stats.score_gap,
                score_ratio: fusion_stats.score_ratio,
            },
            rerank: RerankTelemetry {
                enabled: rerank_stats.pass1_applied,
                candidates: rerank_stats.pass1_input,
                latency_ms: rerank_stats.pass1_latency_ms + rerank_stats.pass2_latency_ms,
                skipped: !rerank_stats.pass1_applied,
                skip_reason: rerank_stats.early_exit_reason.clone(),
            },
            cache: CacheTelemetry {
                embedding_hit: embedding_cache_hit,
                rerank_hit: false,
            },
            total_latency_ms: 0,
            result_count: results.len(),
        };

        Ok((
            SearchResponse {
                request_id: record.request_id,
                query: normalized.raw.clone(),
                store: request.store.clone(),
                results,
                chunks_dropped: postrank_outcome.chunks_dropped,
                total_latency_ms: 0,
                intent: classification.intent,
                difficulty: classification.difficulty,
                strategy: retrieval.strategy,
                confidence: classification.confidence,
                rerank: rerank_stats,
            },
            record,
        ))
    }
}
