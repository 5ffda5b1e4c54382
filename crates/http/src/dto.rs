//! Wire-level request/response shapes for the HTTP transport,
//! translated to and from the orchestrator's internal types at the edge.

use hybridsearch_core::config::Strategy;
use hybridsearch_core::model::{AggregatedResult, Difficulty, Intent};
use hybridsearch_orchestrator::{SearchRequest, SearchResponse};
use hybridsearch_query::StrategyOverrides;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// `SearchRequest` as accepted over HTTP. Every field but `query` is
/// optional; defaults are applied by the strategy selector and orchestrator,
/// not here.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(default)]
pub struct SearchRequestDto {
    pub query: String,
    pub top_k: Option<usize>,
    pub path_prefix: Option<String>,
    pub languages: Vec<String>,
    pub enable_reranking: bool,
    pub rerank_candidates: Option<usize>,
    pub sparse_weight: Option<f32>,
    pub dense_weight: Option<f32>,
    pub group_by_file: bool,
    pub max_chunks_per_file: Option<usize>,
    pub enable_dedup: bool,
    pub dedup_threshold: Option<f32>,
    pub enable_diversity: bool,
    pub diversity_lambda: Option<f32>,
    pub include_content: bool,
}

impl Default for SearchRequestDto {
    fn default() -> Self {
        Self {
            query: String::new(),
            top_k: None,
            path_prefix: None,
            languages: Vec::new(),
            enable_reranking: true,
            rerank_candidates: None,
            sparse_weight: None,
            dense_weight: None,
            group_by_file: false,
            max_chunks_per_file: None,
            enable_dedup: true,
            dedup_threshold: None,
            enable_diversity: true,
            diversity_lambda: None,
            include_content: true,
        }
    }
}

impl SearchRequestDto {
    /// Builds the orchestrator's request type, taking the first of
    /// `languages` as the single-language filter the orchestrator supports
    /// today. Multi-language filtering is not yet wired end to end; noted
    /// as a simplification rather than silently dropped.
    pub fn into_orchestrator_request(self, store: String) -> SearchRequest {
        let overrides = StrategyOverrides {
            sparse_weight: self.sparse_weight,
            dense_weight: self.dense_weight,
            rerank_candidates: self.rerank_candidates,
            enable_reranking: Some(self.enable_reranking),
        };

        SearchRequest {
            store,
            query: self.query,
            top_k: self.top_k,
            strategy_overrides: Some(overrides),
            path_prefix: self.path_prefix,
            language: self.languages.into_iter().next(),
            group_by_file: self.group_by_file,
            include_content: self.include_content,
            enable_dedup: self.enable_dedup,
            enable_diversity: self.enable_diversity,
            dedup_threshold: self.dedup_threshold,
            diversity_lambda: self.diversity_lambda,
            max_chunks_per_file: self.max_chunks_per_file,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct IntelligenceDto {
    pub intent: Intent,
    pub difficulty: Difficulty,
    pub strategy: Strategy,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RerankingDto {
    pub enabled: bool,
    pub candidates: usize,
    pub pass1_applied: bool,
    pub pass1_latency_ms: u64,
    pub pass1_input: usize,
    pub pass1_output: usize,
    pub pass2_applied: bool,
    pub pass2_latency_ms: u64,
    pub pass2_input: usize,
    pub pass2_output: usize,
    pub early_exit: bool,
    pub early_exit_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PostrankDto {
    pub chunks_dropped: usize,
    pub total_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SearchResponseDto {
    pub request_id: Uuid,
    pub query: String,
    pub store: String,
    pub results: Vec<AggregatedResult>,
    pub total: usize,
    pub search_time_ms: u64,
    pub intelligence: IntelligenceDto,
    pub reranking: RerankingDto,
    pub postrank: PostrankDto,
}

impl From<SearchResponse> for SearchResponseDto {
    fn from(response: SearchResponse) -> Self {
        let total = response.results.len();
        Self {
            request_id: response.request_id,
            query: response.query,
            store: response.store,
            intelligence: IntelligenceDto {
                intent: response.intent,
                difficulty: response.difficulty,
                strategy: response.strategy,
                confidence: response.confidence,
            },
            reranking: RerankingDto {
                enabled: response.rerank.pass1_applied || response.rerank.pass2_applied,
                candidates: response.rerank.pass1_input,
                pass1_applied: response.rerank.pass1_applied,
                pass1_latency_ms: response.rerank.pass1_latency_ms,
                pass1_input: response.rerank.pass1_input,
                pass1_output: response.rerank.pass1_output,
                pass2_applied: response.rerank.pass2_applied,
                pass2_latency_ms: response.rerank.pass2_latency_ms,
                pass2_input: response.rerank.pass2_input,
                pass2_output: response.rerank.pass2_output,
                early_exit: response.rerank.early_exit_triggered,
                early_exit_reason: response.rerank.early_exit_reason,
            },
            postrank: PostrankDto {
                chunks_dropped: response.chunks_dropped,
                total_latency_ms: response.total_latency_ms,
            },
            results: response.results,
            total,
            search_time_ms: response.total_latency_ms,
        }
    }
}
