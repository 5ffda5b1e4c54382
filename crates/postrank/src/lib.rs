//! Post-rank pipeline (C7): dedup, MMR diversification, then file-level
//! aggregation, applied strictly after reranking. Each sub-stage is
//! independently toggleable per request via [`PostrankOptions`].

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod aggregate;
pub mod dedup;
pub mod mmr;

pub use aggregate::{aggregate_by_file, AggregationOutcome};
pub use dedup::dedup as dedup_results;
pub use mmr::apply_mmr;

use hybridsearch_core::config::PostrankConfig;
use hybridsearch_core::model::HybridSearchResult;

/// Per-request overrides onto [`PostrankConfig`]'s thresholds. A present
/// field replaces the corresponding config value; absent fields fall back
/// to whatever the orchestrator was configured with.
#[derive(Debug, Clone, Default)]
pub struct PostrankOverrides {
    pub dedup_threshold: Option<f32>,
    pub diversity_lambda: Option<f32>,
    pub max_chunks_per_file: Option<usize>,
}

/// Applies [`PostrankOverrides`] onto a base [`PostrankConfig`], returning
/// the resolved per-request config.
pub fn resolve_postrank_config(base: &PostrankConfig, overrides: &PostrankOverrides) -> PostrankConfig {
    let mut resolved = base.clone();
    if let Some(threshold) = overrides.dedup_threshold {
        resolved.dedup_threshold = threshold;
    }
    if let Some(lambda) = overrides.diversity_lambda {
        resolved.diversity_lambda = lambda;
    }
    if let Some(max_chunks) = overrides.max_chunks_per_file {
        resolved.max_chunks_per_file = max_chunks;
    }
    resolved
}

/// Per-request toggles for the three post-rank sub-stages.
#[derive(Debug, Clone, Copy)]
pub struct PostrankOptions {
    pub enable_dedup: bool,
    pub enable_diversity: bool,
    pub group_by_file: bool,
}

impl Default for PostrankOptions {
    fn default() -> Self {
        Self {
            enable_dedup: true,
            enable_diversity: true,
            group_by_file: false,
        }
    }
}

/// Runs the post-rank pipeline: dedup, then MMR, then file aggregation,
/// each run only when its [`PostrankOptions`] flag is set. When
/// `group_by_file` is off, results keep the reranked order unchanged and
/// `chunks_dropped` is always zero.
pub fn run_postrank_pipeline(
    results: Vec<HybridSearchResult>,
    config: &PostrankConfig,
    options: &PostrankOptions,
) -> AggregationOutcome {
    let deduped = if options.enable_dedup {
        dedup_results(results, config)
    } else {
        results
    };

    let diversified = if options.enable_diversity {
        apply_mmr(deduped, config.diversity_lambda)
    } else {
        deduped
    };

    if options.group_by_file {
        aggregate_by_file(diversified, config.max_chunks_per_file)
    } else {
        AggregationOutcome {
            results: diversified.into_iter().map(Into::into).collect(),
            chunks_dropped: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(doc_id: &str, path: &str, content: &str, score: f32) -> HybridSearchResult {
        HybridSearchResult {
            doc_id: doc_id.to_string(),
            path: path.to_string(),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 2,
            content: Some(content.to_string()),
            symbols: vec![],
            sparse_score: 0.0,
            dense_score: 0.0,
            sparse_rank: 1,
            dense_rank: 0,
            final_score: score,
            fusion_score: score,
        }
    }

    #[test]
    fn pipeline_dedupes_diversifies_and_aggregates() {
        let config = PostrankConfig::default();
        let options = PostrankOptions {
            group_by_file: true,
            ..PostrankOptions::default()
        };
        let results = vec![
            result("a", "a.rs", "fn alpha beta gamma delta epsilon", 1.0),
            result("b", "a.rs", "fn alpha beta gamma delta epsilon", 0.9),
            result("c", "b.rs", "completely unrelated content here yes", 0.8),
        ];
        let outcome = run_postrank_pipeline(results, &config, &options);
        // "b" is a near-duplicate of "a" in the same file and gets dropped.
        assert!(outcome.results.iter().all(|r| r.result.doc_id != "b"));
        assert_eq!(outcome.results.len(), 2);
    }

    #[test]
    fn disabling_group_by_file_leaves_order_and_chunks_dropped_at_zero() {
        let config = PostrankConfig {
            max_chunks_per_file: 1,
            ..PostrankConfig::default()
        };
        let options = PostrankOptions {
            enable_dedup: false,
            enable_diversity: false,
            group_by_file: false,
        };
        let results = vec![
            result("a", "a.rs", "fn alpha beta gamma delta epsilon", 1.0),
            result("b", "a.rs", "fn alpha beta gamma delta epsilon", 0.9),
        ];
        let outcome = run_postrank_pipeline(results, &config, &options);
        assert_eq!(outcome.chunks_dropped, 0);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].result.doc_id, "a");
        assert_eq!(outcome.results[1].result.doc_id, "b");
    }
}
