//! Request/response types for the search orchestrator (C9).

use hybridsearch_core::config::Strategy;
use hybridsearch_core::model::{AggregatedResult, Difficulty, Intent, RerankStats};
use hybridsearch_query::StrategyOverrides;
use uuid::Uuid;

/// A single search request, after transport-level decoding but before any
/// pipeline stage has run.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub store: String,
    pub query: String,
    pub top_k: Option<usize>,
    pub strategy_overrides: Option<StrategyOverrides>,
    pub path_prefix: Option<String>,
    pub language: Option<String>,
    pub group_by_file: bool,
    pub include_content: bool,
    pub enable_dedup: bool,
    pub enable_diversity: bool,
    pub dedup_threshold: Option<f32>,
    pub diversity_lambda: Option<f32>,
    pub max_chunks_per_file: Option<usize>,
}

impl SearchRequest {
    pub fn new(store: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            query: query.into(),
            top_k: None,
            strategy_overrides: None,
            path_prefix: None,
            language: None,
            group_by_file: true,
            include_content: true,
            enable_dedup: true,
            enable_diversity: true,
            dedup_threshold: None,
            diversity_lambda: None,
            max_chunks_per_file: None,
        }
    }
}

/// The orchestrator's output: the aggregated, ranked results plus the
/// allocated request id for correlation with telemetry, and the
/// intelligence/reranking metadata a transport adapter echoes back
/// verbatim.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub request_id: Uuid,
    pub query: String,
    pub store: String,
    pub results: Vec<AggregatedResult>,
    pub chunks_dropped: usize,
    pub total_latency_ms: u64,
    pub intent: Intent,
    pub difficulty: Difficulty,
    pub strategy: Strategy,
    pub confidence: f32,
    pub rerank: RerankStats,
}
