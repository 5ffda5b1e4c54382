//! Maximal Marginal Relevance diversification (C7): a word-overlap
//! `content_similarity` measure plus greedy, lambda-weighted selection.

use std::collections::HashSet;

use hybridsearch_core::model::HybridSearchResult;

fn content_similarity(a: &str, b: &str) -> f32 {
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    let intersection = words_a.intersection(&words_b).count();
    let union = words_a.union(&words_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// `applyMmr(results, lambda) -> [HybridSearchResult]`.
///
/// Greedily selects the result maximizing
/// `lambda * relevance - (1 - lambda) * max_similarity_to_selected` at each
/// step. Reorders the full input; nothing is dropped here, since
/// deduplication already removed near-duplicates upstream.
pub fn apply_mmr(results: Vec<HybridSearchResult>, lambda: f32) -> Vec<HybridSearchResult> {
    let mut remaining = results;
    let mut selected: Vec<HybridSearchResult> = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_mmr = f32::NEG_INFINITY;

        for (i, candidate) in remaining.iter().enumerate() {
            let candidate_content = candidate.content.as_deref().unwrap_or("");
            let diversity_penalty = if selected.is_empty() {
                0.0
            } else {
                selected
                    .iter()
                    .map(|s| content_similarity(candidate_content, s.content.as_deref().unwrap_or("")))
                    .fold(f32::NEG_INFINITY, f32::max)
            };

            let mmr_score = lambda * candidate.final_score - (1.0 - lambda) * diversity_penalty;
            if mmr_score > best_mmr {
                best_mmr = mmr_score;
                best_idx = i;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    selected
}
