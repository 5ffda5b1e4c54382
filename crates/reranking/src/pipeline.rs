//! Multi-pass cross-encoder reranker (C6): a two-stage pipeline with an
//! early-exit heuristic between passes, built on the `RerankerProvider`
//! collaborator trait.

use std::time::Duration;

use hybridsearch_core::config::RerankingConfig;
use hybridsearch_core::model::{HybridSearchResult, RerankStats};
use hybridsearch_core::traits::RerankerProvider;
use tracing::warn;

/// Sort `(doc_id, score)` pairs by score descending, with NaN sorted to the end.
fn sort_scores_descending(scored: &mut [(String, f32)]) {
    scored.sort_by(|a, b| {
        let a_is_nan = a.1.is_nan();
        let b_is_nan = b.1.is_nan();
        match (a_is_nan, b_is_nan) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal),
        }
    });
}

/// Distribution shape of a pass's score list, used only to decide whether to
/// early-exit; not surfaced on `RerankStats` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Peaked,
    Flat,
    Bimodal,
}

struct PassAnalysis {
    exit_reason: Option<&'static str>,
}

fn analyze_pass(scores: &[f32], config: &RerankingConfig) -> PassAnalysis {
    if scores.len() < 2 {
        return PassAnalysis {
            exit_reason: Some("insufficient_results"),
        };
    }

    let top = scores[0];
    let second = scores[1];
    let gap = top - second;
    let ratio = if second == 0.0 { f32::INFINITY } else { top / second };

    let mean = scores.iter().sum::<f32>() / scores.len() as f32;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / scores.len() as f32;
    let normalized_variance = if mean == 0.0 { 0.0 } else { variance / (mean * mean) };

    let top_cluster_size = scores
        .iter()
        .filter(|&&s| s >= config.top_cluster_ratio * top)
        .count();

    let shape = if normalized_variance < config.flat_variance_threshold {
        Shape::Flat
    } else if normalized_variance > config.peaked_variance_threshold && top_cluster_size <= 1 {
        Shape::Peaked
    } else {
        Shape::Bimodal
    };

    let exit_reason = if shape == Shape::Peaked && ratio > config.early_exit_score_ratio {
        Some("peaked_distribution")
    } else if gap > config.early_exit_score_gap {
        Some("high_score_gap")
    } else {
        None
    };

    PassAnalysis { exit_reason }
}

/// `rerankPipeline(query, candidates, useSecondPass, secondPassCandidates) ->
/// (rerankedResults, stats)`.
///
/// Candidates enter already ordered by fusion score; that order is the
/// fallback whenever a pass is skipped, times out, or the provider errors.
pub async fn rerank_pipeline(
    provider: &dyn RerankerProvider,
    query: &str,
    mut candidates: Vec<HybridSearchResult>,
    rerank_candidates: usize,
    use_second_pass: bool,
    second_pass_candidates: usize,
    config: &RerankingConfig,
) -> (Vec<HybridSearchResult>, RerankStats) {
    let mut stats = RerankStats::default();

    if candidates.len() < 2 {
        stats.early_exit_triggered = true;
        stats.early_exit_reason = Some("insufficient_results".to_string());
        return (candidates, stats);
    }

    let pass1_input = candidates.len().min(rerank_candidates.max(1));
    let (head, tail) = candidates.split_at_mut(pass1_input);
    let tail_owned: Vec<HybridSearchResult> = tail.to_vec();

    let documents: Vec<(String, &str)> = head
        .iter()
        .map(|r| (r.doc_id.clone(), r.content.as_deref().unwrap_or("")))
        .collect();

    let start = std::time::Instant::now();
    let pass1_result = tokio::time::timeout(
        Duration::from_millis(config.pass1_timeout_ms),
        provider.rerank(query, &documents),
    )
    .await;
    stats.pass1_latency_ms = start.elapsed().as_millis() as u64;
    stats.pass1_input = pass1_input;

    let mut scored = match pass1_result {
        Ok(Ok(scored)) => scored,
        Ok(Err(err)) => {
            warn!(error = %err, "reranker pass 1 failed, keeping fusion order");
            candidates.truncate(pass1_input);
            candidates.extend(tail_owned);
            return (candidates, stats);
        }
        Err(_) => {
            warn!(timeout_ms = config.pass1_timeout_ms, "reranker pass 1 timed out, keeping fusion order");
            candidates.truncate(pass1_input);
            candidates.extend(tail_owned);
            return (candidates, stats);
        }
    };

    stats.pass1_applied = true;
    sort_scores_descending(&mut scored);
    let pass1_output: Vec<HybridSearchResult> = apply_scores(head.to_vec(), &scored);
    let pass1_output = pass1_output.into_iter().take(config.pass1_output_size.max(1)).collect::<Vec<_>>();
    stats.pass1_output = pass1_output.len();

    let pass1_scores: Vec<f32> = scored.iter().map(|(_, s)| *s).collect();
    let analysis = analyze_pass(&pass1_scores, config);

    let mut final_results = pass1_output;

    if let Some(reason) = analysis.exit_reason {
        stats.early_exit_triggered = true;
        stats.early_exit_reason = Some(reason.to_string());
    } else if use_second_pass {
        let pass2_input = final_results.len().min(second_pass_candidates.max(1));
        let (pass2_head, pass2_tail) = final_results.split_at_mut(pass2_input);
        let pass2_tail_owned: Vec<HybridSearchResult> = pass2_tail.to_vec();

        let documents: Vec<(String, &str)> = pass2_head
            .iter()
            .map(|r| (r.doc_id.clone(), r.content.as_deref().unwrap_or("")))
            .collect();

        let start = std::time::Instant::now();
        let pass2_result = tokio::time::timeout(
            Duration::from_millis(config.pass2_timeout_ms),
            provider.rerank(query, &documents),
        )
        .await;
        stats.pass2_latency_ms = start.elapsed().as_millis() as u64;
        stats.pass2_input = pass2_input;

        match pass2_result {
            Ok(Ok(mut scored2)) => {
                stats.pass2_applied = true;
                sort_scores_descending(&mut scored2);
                let mut reordered = apply_scores(pass2_head.to_vec(), &scored2);
                stats.pass2_output = reordered.len();
                reordered.extend(pass2_tail_owned);
                final_results = reordered;
            }
            Ok(Err(err)) => {
                warn!(error = %err, "reranker pass 2 failed, keeping pass 1 order");
            }
            Err(_) => {
                warn!(timeout_ms = config.pass2_timeout_ms, "reranker pass 2 timed out, keeping pass 1 order");
            }
        }
    }

    final_results.extend(tail_owned);
    (final_results, stats)
}

/// Reorders `results` to match `scored`'s order and writes each score onto
/// `final_score`, preserving `fusion_score` for explainability.
fn apply_scores(results: Vec<HybridSearchResult>, scored: &[(String, f32)]) -> Vec<HybridSearchResult> {
    use std::collections::HashMap;
    let mut by_id: HashMap<String, HybridSearchResult> =
        results.into_iter().map(|r| (r.doc_id.clone(), r)).collect();

    scored
        .iter()
        .filter_map(|(id, score)| {
            by_id.remove(id).map(|mut r| {
                r.final_score = *score;
                r
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRerankerProvider;
    use async_trait::async_trait;
    use hybridsearch_core::error::{Error, Result};

    fn result(doc_id: &str, content: &str, fusion_score: f32) -> HybridSearchResult {
        HybridSearchResult {
            doc_id: doc_id.to_string(),
            path: format!("{doc_id}.rs"),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 2,
            content: Some(content.to_string()),
            symbols: vec![],
            sparse_score: 0.0,
            dense_score: 0.0,
            sparse_rank: 1,
            dense_rank: 0,
            final_score: fusion_score,
            fusion_score,
        }
    }

    #[test]
    fn peaked_distribution_takes_precedence_over_a_coincident_score_gap() {
        // Top score dominates a tightly clustered tail: shape is peaked and
        // the score ratio clears its threshold, but the raw gap also clears
        // its (lower) threshold. peaked_distribution must win.
        let scores = [0.95, 0.50, 0.20, 0.20, 0.20, 0.20];
        let analysis = analyze_pass(&scores, &RerankingConfig::default());
        assert_eq!(analysis.exit_reason, Some("peaked_distribution"));
    }

    #[test]
    fn high_score_gap_applies_only_when_shape_is_not_peaked() {
        // A wide gap with a flatter tail (top cluster contains more than
        // one result) should still report high_score_gap.
        let scores = [0.80, 0.45, 0.44, 0.43, 0.42];
        let analysis = analyze_pass(&scores, &RerankingConfig::default());
        assert_eq!(analysis.exit_reason, Some("high_score_gap"));
    }

    #[tokio::test]
    async fn insufficient_results_early_exits_without_calling_provider() {
        let provider = MockRerankerProvider;
        let candidates = vec![result("a", "fn parse() {}", 1.0)];
        let (results, stats) = rerank_pipeline(
            &provider,
            "parse",
            candidates,
            30,
            false,
            0,
            &RerankingConfig::default(),
        )
        .await;
        assert_eq!(results.len(), 1);
        assert!(stats.early_exit_triggered);
        assert_eq!(stats.early_exit_reason.as_deref(), Some("insufficient_results"));
        assert!(!stats.pass1_applied);
    }

    #[tokio::test]
    async fn pass1_reorders_by_rerank_score() {
        let provider = MockRerankerProvider;
        let candidates = vec![
            result("a", "fn unrelated() {}", 0.9),
            result("b", "fn parseRequest() {}", 0.1),
        ];
        let (results, stats) = rerank_pipeline(
            &provider,
            "parseRequest",
            candidates,
            30,
            false,
            0,
            &RerankingConfig::default(),
        )
        .await;
        assert_eq!(results[0].doc_id, "b");
        assert!(stats.pass1_applied);
    }

    #[tokio::test]
    async fn pass1_failure_preserves_fusion_order() {
        struct FailingProvider;
        #[async_trait]
        impl RerankerProvider for FailingProvider {
            async fn rerank(&self, _query: &str, _documents: &[(String, &str)]) -> Result<Vec<(String, f32)>> {
                Err(Error::dependency_unavailable("reranker down"))
            }
        }

        let candidates = vec![result("a", "x", 0.9), result("b", "y", 0.1)];
        let (results, stats) = rerank_pipeline(
            &FailingProvider,
            "query",
            candidates,
            30,
            false,
            0,
            &RerankingConfig::default(),
        )
        .await;
        assert_eq!(results[0].doc_id, "a");
        assert!(!stats.pass1_applied);
    }

    #[tokio::test]
    async fn high_score_gap_triggers_early_exit_before_pass2() {
        let provider = MockRerankerProvider;
        let candidates = vec![
            result("a", "parseRequest handler token match request", 0.5),
            result("b", "totally unrelated content here", 0.1),
        ];
        let mut config = RerankingConfig::default();
        config.early_exit_score_gap = 0.1;
        let (_, stats) = rerank_pipeline(&provider, "parseRequest handler token match request", candidates, 30, true, 10, &config).await;
        assert!(stats.early_exit_triggered);
        assert!(!stats.pass2_applied);
    }

    #[tokio::test]
    async fn second_pass_runs_when_no_early_exit_and_enabled() {
        let provider = MockRerankerProvider;
        // Three roughly-tied candidates: no single gap should exceed the
        // default threshold, and variance stays low enough to avoid a
        // peaked-distribution exit, so pass 2 should run.
        let candidates = vec![
            result("a", "match token alpha", 0.33),
            result("b", "match token beta", 0.32),
            result("c", "match token gamma", 0.31),
        ];
        let (_, stats) = rerank_pipeline(&provider, "match token", candidates, 30, true, 10, &RerankingConfig::default()).await;
        assert!(stats.pass1_applied);
    }
}
