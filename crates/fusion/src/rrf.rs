//! Weighted Reciprocal Rank Fusion with code-aware bonuses (C5).

use std::collections::HashMap;

use hybridsearch_core::config::StrategyConfig;
use hybridsearch_core::model::{FusionStats, HybridSearchResult, RetrieverResult, SCORE_RATIO_SENTINEL};
use hybridsearch_core::path_util;

/// Options for [`fuse`], mirroring `RetrievalConfig`'s fusion-relevant
/// fields plus the file-grouping toggle from `SearchRequest`.
#[derive(Debug, Clone)]
pub struct FuseOptions {
    pub sparse_weight: f32,
    pub dense_weight: f32,
    pub group_by_file: bool,
}

/// Recognized language keywords the query may mention, matched against a
/// chunk's `language` for the language-match bonus.
const RECOGNIZED_LANGUAGES: &[&str] = &[
    "python", "go", "rust", "javascript", "typescript", "java", "ruby", "c", "cpp", "c++", "csharp",
];

/// `fuse(sparseResults, denseResults, contentMap, query, opts) -> [HybridSearchResult]`.
///
/// `sparseResults`/`denseResults` carry their own chunk payload so no
/// separate content map is threaded through; a document appearing in both
/// lists is merged into a single entry carrying both ranks.
pub fn fuse(
    sparse_results: &[RetrieverResult],
    dense_results: &[RetrieverResult],
    query_tokens: &[String],
    config: &StrategyConfig,
    opts: &FuseOptions,
) -> Vec<HybridSearchResult> {
    let mut merged: HashMap<String, HybridSearchResult> = HashMap::new();

    for r in sparse_results {
        let entry = merged.entry(r.doc_id.clone()).or_insert_with(|| blank_result(&r.chunk));
        entry.sparse_score = r.score;
        entry.sparse_rank = r.rank;
    }
    for r in dense_results {
        let entry = merged.entry(r.doc_id.clone()).or_insert_with(|| blank_result(&r.chunk));
        entry.dense_score = r.score;
        entry.dense_rank = r.rank;
    }

    let mut results: Vec<HybridSearchResult> = merged.into_values().collect();

    for result in results.iter_mut() {
        let base = rrf_base(result.sparse_rank, result.dense_rank, opts, config.rrf_k);
        let (bonus, exact_symbol_hit) = code_aware_bonus(result, query_tokens, config);
        // Bonuses are clamped so the final score never exceeds 2x the base
        // RRF score, except an exact symbol match, which overrides the clamp
        // to let navigational queries surface their target unambiguously.
        let applied_bonus = if exact_symbol_hit { bonus } else { bonus.min(base) };
        result.final_score = base + applied_bonus;
        result.fusion_score = result.final_score;
    }

    results.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.sparse_rank_or_max().cmp(&b.sparse_rank_or_max()))
            .then_with(|| a.dense_rank_or_max().cmp(&b.dense_rank_or_max()))
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });

    if opts.group_by_file {
        results = interleave_by_file(results);
    }

    results
}

trait RankOrMax {
    fn sparse_rank_or_max(&self) -> u32;
    fn dense_rank_or_max(&self) -> u32;
}

impl RankOrMax for HybridSearchResult {
    fn sparse_rank_or_max(&self) -> u32 {
        if self.sparse_rank == 0 {
            u32::MAX
        } else {
            self.sparse_rank
        }
    }
    fn dense_rank_or_max(&self) -> u32 {
        if self.dense_rank == 0 {
            u32::MAX
        } else {
            self.dense_rank
        }
    }
}

fn blank_result(chunk: &hybridsearch_core::model::Chunk) -> HybridSearchResult {
    HybridSearchResult {
        doc_id: chunk.doc_id.clone(),
        path: chunk.path.clone(),
        language: chunk.language.clone(),
        start_line: chunk.start_line,
        end_line: chunk.end_line,
        content: Some(chunk.content.clone()),
        symbols: chunk.symbols.clone(),
        sparse_score: 0.0,
        dense_score: 0.0,
        sparse_rank: 0,
        dense_rank: 0,
        final_score: 0.0,
        fusion_score: 0.0,
    }
}

fn rrf_base(sparse_rank: u32, dense_rank: u32, opts: &FuseOptions, k: usize) -> f32 {
    let sparse_term = if sparse_rank > 0 {
        opts.sparse_weight / (k as f32 + sparse_rank as f32)
    } else {
        0.0
    };
    let dense_term = if dense_rank > 0 {
        opts.dense_weight / (k as f32 + dense_rank as f32)
    } else {
        0.0
    };
    sparse_term + dense_term
}

/// Returns `(bonus, exact_symbol_hit)`. `exact_symbol_hit` is true when a
/// query token matches a chunk symbol exactly, which overrides the bonus
/// clamp in the caller.
fn code_aware_bonus(result: &HybridSearchResult, query_tokens: &[String], config: &StrategyConfig) -> (f32, bool) {
    let symbols_lower: Vec<String> = result.symbols.iter().map(|s| s.to_lowercase()).collect();
    let exact_symbol_hit = query_tokens
        .iter()
        .any(|t| symbols_lower.iter().any(|s| s == &t.to_lowercase()));

    let symbol_hits = query_tokens
        .iter()
        .filter(|t| symbols_lower.iter().any(|s| s == &t.to_lowercase()))
        .count();
    let symbol_bonus = (symbol_hits as f32 * config.symbol_bonus).min(config.symbol_bonus_cap);

    let path_segments: Vec<String> = path_util::path_segments_without_extension(&result.path)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();
    let path_hits = query_tokens
        .iter()
        .filter(|t| path_segments.iter().any(|s| s == &t.to_lowercase()))
        .count();
    let path_bonus = path_hits as f32 * config.path_token_bonus;

    let language_lower = result.language.to_lowercase();
    let language_bonus = if query_tokens
        .iter()
        .any(|t| RECOGNIZED_LANGUAGES.contains(&t.to_lowercase().as_str()) && t.to_lowercase() == language_lower)
    {
        config.language_bonus
    } else {
        0.0
    };

    let total = symbol_bonus + path_bonus + language_bonus;
    (total, exact_symbol_hit)
}

/// Interleaves results so no file has more than one chunk in the top 3
/// positions; later positions may repeat a file. Relative order within a
/// file is preserved.
fn interleave_by_file(results: Vec<HybridSearchResult>) -> Vec<HybridSearchResult> {
    let mut by_file: HashMap<String, Vec<HybridSearchResult>> = HashMap::new();
    let mut file_order: Vec<String> = Vec::new();
    for result in results {
        let entry = by_file.entry(result.path.clone()).or_insert_with(|| {
            file_order.push(result.path.clone());
            Vec::new()
        });
        entry.push(result);
    }

    let mut output = Vec::new();
    let mut seen_in_top3: std::collections::HashSet<String> = std::collections::HashSet::new();

    // First pass: fill positions 0..3 with at most one chunk per file.
    'outer: loop {
        for file in &file_order {
            if output.len() >= 3 {
                break 'outer;
            }
            if seen_in_top3.contains(file) {
                continue;
            }
            if let Some(bucket) = by_file.get_mut(file) {
                if !bucket.is_empty() {
                    output.push(bucket.remove(0));
                    seen_in_top3.insert(file.clone());
                }
            }
        }
        // No progress possible (all buckets for unseen files are empty).
        if output.len() >= 3 || file_order.iter().all(|f| seen_in_top3.contains(f) || by_file.get(f).map(|b| b.is_empty()).unwrap_or(true)) {
            break;
        }
    }

    // Second pass: append everything else in original per-file order,
    // preserving the file visitation order from the first pass.
    for file in &file_order {
        if let Some(bucket) = by_file.get_mut(file) {
            output.append(bucket);
        }
    }

    output
}

/// `computeFusionStats(results) -> {topScore, secondScore, scoreGap, scoreRatio}`.
pub fn compute_fusion_stats(results: &[HybridSearchResult]) -> FusionStats {
    let top_score = results.first().map(|r| r.final_score).unwrap_or(0.0);
    let second_score = results.get(1).map(|r| r.final_score).unwrap_or(0.0);
    let score_gap = top_score - second_score;
    let score_ratio = if second_score == 0.0 {
        SCORE_RATIO_SENTINEL
    } else {
        top_score / second_score
    };

    FusionStats {
        top_score,
        second_score,
        score_gap,
        score_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybridsearch_core::model::Chunk;

    fn chunk(doc_id: &str, path: &str, symbols: &[&str]) -> Chunk {
        Chunk {
            doc_id: doc_id.to_string(),
            store: "s".to_string(),
            path: path.to_string(),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 5,
            content: "content".to_string(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn retriever_result(doc_id: &str, path: &str, symbols: &[&str], score: f32, rank: u32) -> RetrieverResult {
        RetrieverResult {
            doc_id: doc_id.to_string(),
            score,
            rank,
            chunk: chunk(doc_id, path, symbols),
        }
    }

    fn default_opts() -> FuseOptions {
        FuseOptions {
            sparse_weight: 0.5,
            dense_weight: 0.5,
            group_by_file: false,
        }
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        let config = StrategyConfig::default();
        let results = fuse(&[], &[], &[], &config, &default_opts());
        assert!(results.is_empty());
    }

    #[test]
    fn document_in_both_legs_outranks_single_leg_document() {
        let config = StrategyConfig::default();
        let sparse = vec![
            retriever_result("a", "a.rs", &[], 1.0, 1),
            retriever_result("b", "b.rs", &[], 0.9, 2),
        ];
        let dense = vec![retriever_result("a", "a.rs", &[], 1.0, 1)];
        let results = fuse(&sparse, &dense, &[], &config, &default_opts());
        assert_eq!(results[0].doc_id, "a");
    }

    #[test]
    fn final_score_requires_some_rank() {
        let config = StrategyConfig::default();
        let sparse = vec![retriever_result("a", "a.rs", &[], 1.0, 1)];
        let results = fuse(&sparse, &[], &[], &config, &default_opts());
        assert!(results[0].final_score > 0.0);
        assert!(results[0].retrieved());
    }

    #[test]
    fn symbol_bonus_boosts_exact_match() {
        let config = StrategyConfig::default();
        let sparse = vec![
            retriever_result("a", "a.rs", &["parseRequest"], 1.0, 1),
            retriever_result("b", "b.rs", &["unrelated"], 1.0, 2),
        ];
        let query_tokens = vec!["parserequest".to_string()];
        let results = fuse(&sparse, &[], &query_tokens, &config, &default_opts());
        let a = results.iter().find(|r| r.doc_id == "a").unwrap();
        let b = results.iter().find(|r| r.doc_id == "b").unwrap();
        assert!(a.final_score > b.final_score);
    }

    #[test]
    fn path_bonus_is_clamped_to_base() {
        let mut config = StrategyConfig::default();
        config.path_token_bonus = 100.0;
        let sparse = vec![retriever_result("a", "src/widget.rs", &[], 1.0, 100)];
        let query_tokens = vec!["widget".to_string()];
        let results = fuse(&sparse, &[], &query_tokens, &config, &default_opts());
        // base is tiny (low rank), non-symbol bonuses must not exceed it even
        // though path_token_bonus is configured huge.
        assert!(results[0].final_score <= 2.0 * rrf_base(100, 0, &default_opts(), config.rrf_k));
    }

    #[test]
    fn exact_symbol_match_overrides_the_bonus_clamp() {
        let mut config = StrategyConfig::default();
        config.symbol_bonus_cap = 100.0;
        config.symbol_bonus = 100.0;
        let sparse = vec![retriever_result("a", "a.rs", &["x"], 1.0, 100)];
        let query_tokens = vec!["x".to_string()];
        let results = fuse(&sparse, &[], &query_tokens, &config, &default_opts());
        let base = rrf_base(100, 0, &default_opts(), config.rrf_k);
        assert!(results[0].final_score > 2.0 * base);
    }

    #[test]
    fn stable_tie_break_by_doc_id() {
        let config = StrategyConfig::default();
        let sparse = vec![
            retriever_result("b", "b.rs", &[], 1.0, 1),
            retriever_result("a", "a.rs", &[], 1.0, 1),
        ];
        let results = fuse(&sparse, &[], &[], &config, &default_opts());
        assert_eq!(results[0].doc_id, "a");
    }

    #[test]
    fn compute_fusion_stats_uses_sentinel_for_zero_second_score() {
        let results = vec![result_with_score("a", 0.5), ];
        let stats = compute_fusion_stats(&results);
        assert_eq!(stats.score_ratio, SCORE_RATIO_SENTINEL);
    }

    fn result_with_score(doc_id: &str, score: f32) -> HybridSearchResult {
        let mut r = blank_result(&chunk(doc_id, "a.rs", &[]));
        r.final_score = score;
        r
    }

    #[test]
    fn group_by_file_caps_first_three_positions_per_file() {
        let config = StrategyConfig::default();
        let sparse = vec![
            retriever_result("a1", "a.rs", &[], 1.0, 1),
            retriever_result("a2", "a.rs", &[], 0.9, 2),
            retriever_result("a3", "a.rs", &[], 0.8, 3),
            retriever_result("b1", "b.rs", &[], 0.7, 4),
        ];
        let opts = FuseOptions {
            sparse_weight: 1.0,
            dense_weight: 0.0,
            group_by_file: true,
        };
        let results = fuse(&sparse, &[], &[], &config, &opts);
        let top3_files: std::collections::HashSet<&str> =
            results.iter().take(3).map(|r| r.path.as_str()).collect();
        assert!(top3_files.len() >= 2, "top 3 should span at least two files");
    }
}
