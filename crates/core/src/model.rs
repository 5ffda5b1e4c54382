//! Shared request/response and intermediate data model.
//!
//! These types are produced and destroyed once per request; nothing here is
//! mutated across requests except through the telemetry sink, which is
//! append-only.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use crate::config::Strategy;

/// A contiguous code region with metadata; the unit of retrieval.
///
/// Invariant: `start_line <= end_line`; `(store, doc_id)` is unique;
/// `content` is the exact text used at indexing and reranking time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub store: String,
    pub path: String,
    pub language: String,
    pub start_line: u32,
    pub end_line: u32,
    pub content: String,
    pub symbols: Vec<String>,
}

impl Chunk {
    pub fn is_valid(&self) -> bool {
        self.start_line <= self.end_line
    }
}

/// A query after canonicalization, used for caching and downstream stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedQuery {
    pub raw: String,
    pub normalized: String,
    pub fingerprint: String,
}

/// Query intent, derived purely from a `NormalizedQuery` with no I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum Intent {
    Navigational,
    Factual,
    Exploratory,
    Analytical,
}

/// Query difficulty, used to scale candidate counts in the strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// `{intent, difficulty, confidence, signals}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub difficulty: Difficulty,
    pub confidence: f32,
    pub signals: Vec<String>,
}

/// Fully-resolved retrieval configuration for one request, after preset
/// selection, difficulty adjustment, and user overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub strategy: Strategy,
    pub sparse_top_k: usize,
    pub dense_top_k: usize,
    pub sparse_weight: f32,
    pub dense_weight: f32,
    pub rerank_candidates: usize,
    pub use_second_pass: bool,
    pub second_pass_candidates: usize,
}

/// One retriever's hit list: `(doc_id, score, rank)` plus payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieverResult {
    pub doc_id: String,
    pub score: f32,
    pub rank: u32,
    pub chunk: Chunk,
}

/// A fused candidate from both retrieval legs.
///
/// `rank = 0` means "not retrieved by that leg". Ordered by `final_score`
/// descending once produced by the hybrid ranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct HybridSearchResult {
    pub doc_id: String,
    pub path: String,
    pub language: String,
    pub start_line: u32,
    pub end_line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub symbols: Vec<String>,
    pub sparse_score: f32,
    pub dense_score: f32,
    pub sparse_rank: u32,
    pub dense_rank: u32,
    pub final_score: f32,
    /// The fusion score this result carried before reranking, kept
    /// alongside the (authoritative) rerank-derived `final_score` for
    /// explainability.
    pub fusion_score: f32,
}

impl HybridSearchResult {
    pub fn retrieved(&self) -> bool {
        self.sparse_rank > 0 || self.dense_rank > 0
    }
}

/// `{topScore, secondScore, scoreGap, scoreRatio}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FusionStats {
    pub top_score: f32,
    pub second_score: f32,
    pub score_gap: f32,
    pub score_ratio: f32,
}

/// Sentinel used by `scoreRatio` when the second score is zero.
pub const SCORE_RATIO_SENTINEL: f32 = 999.0;

/// Reranker pass telemetry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RerankStats {
    pub pass1_applied: bool,
    pub pass1_latency_ms: u64,
    pub pass1_input: usize,
    pub pass1_output: usize,
    pub pass2_applied: bool,
    pub pass2_latency_ms: u64,
    pub pass2_input: usize,
    pub pass2_output: usize,
    pub early_exit_triggered: bool,
    pub early_exit_reason: Option<String>,
}

/// A `HybridSearchResult` annotated with file-grouping metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct AggregatedResult {
    #[serde(flatten)]
    pub result: HybridSearchResult,
    pub is_representative: Option<bool>,
    pub related_chunks: Option<usize>,
    pub file_score: Option<f32>,
    pub chunk_rank_in_file: Option<usize>,
}

impl From<HybridSearchResult> for AggregatedResult {
    fn from(result: HybridSearchResult) -> Self {
        Self {
            result,
            is_representative: None,
            related_chunks: None,
            file_score: None,
            chunk_rank_in_file: None,
        }
    }
}

/// Per-leg telemetry summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegStats {
    pub count: usize,
    pub latency_ms: u64,
    pub top_score: f32,
    pub std_dev: f32,
}

/// Fusion-stage telemetry summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionTelemetry {
    pub count: usize,
    pub latency_ms: u64,
    pub top_score: f32,
    pub second_score: f32,
    pub score_gap: f32,
    pub score_ratio: f32,
}

/// Rerank-stage telemetry summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RerankTelemetry {
    pub enabled: bool,
    pub candidates: usize,
    pub latency_ms: u64,
    pub skipped: bool,
    pub skip_reason: Option<String>,
}

/// Cache-hit telemetry summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheTelemetry {
    pub embedding_hit: bool,
    pub rerank_hit: bool,
}

/// One per-query structured telemetry record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub request_id: Uuid,
    pub timestamp: String,
    pub store: String,
    pub query: String,
    pub intent: Intent,
    pub strategy: Strategy,
    pub sparse: LegStats,
    pub dense: LegStats,
    pub fusion: FusionTelemetry,
    pub rerank: RerankTelemetry,
    pub cache: CacheTelemetry,
    pub total_latency_ms: u64,
    pub result_count: usize,
}

/// `{stdDev, mean, p50, p95}` helper output.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreStats {
    pub mean: f32,
    pub std_dev: f32,
    pub p50: f32,
    pub p95: f32,
}

/// Computes summary statistics over a slice of scores. Empty input yields
/// all-zero stats rather than panicking, since a leg can legitimately
/// return zero hits.
pub fn compute_score_stats(scores: &[f32]) -> ScoreStats {
    if scores.is_empty() {
        return ScoreStats::default();
    }
    let mut sorted: Vec<f32> = scores.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let mean = sorted.iter().sum::<f32>() / n as f32;
    let variance = sorted.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n as f32;
    let std_dev = variance.sqrt();

    let percentile = |p: f32| -> f32 {
        let idx = ((p * (n as f32 - 1.0)).round() as usize).min(n - 1);
        sorted[idx]
    };

    ScoreStats {
        mean,
        std_dev,
        p50: percentile(0.50),
        p95: percentile(0.95),
    }
}
