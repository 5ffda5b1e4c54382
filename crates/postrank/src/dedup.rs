//! Shingle-based near-duplicate removal (C7).
//!
//! Deduplication runs on 5-gram shingles of whitespace tokens rather than a
//! shared embedding cache, so it stays deterministic without depending on
//! whichever dense model produced a result's vector.

use std::collections::HashSet;

use hybridsearch_core::config::PostrankConfig;
use hybridsearch_core::model::HybridSearchResult;

const SHINGLE_SIZE: usize = 5;

fn tokenize(content: &str) -> Vec<String> {
    content.split_whitespace().map(|t| t.to_lowercase()).collect()
}

fn shingles(tokens: &[String]) -> HashSet<String> {
    if tokens.len() < SHINGLE_SIZE {
        return [tokens.join(" ")].into_iter().collect();
    }
    tokens.windows(SHINGLE_SIZE).map(|w| w.join(" ")).collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}

/// `dedup(results) -> [HybridSearchResult]`.
///
/// The first `config.preserve_top` results are always kept. Beyond that, a
/// candidate is dropped when its shingle-Jaccard similarity to an already-kept
/// result meets the threshold and either they share a path, or their lengths
/// are within `config.dedup_length_ratio` of each other.
pub fn dedup(results: Vec<HybridSearchResult>, config: &PostrankConfig) -> Vec<HybridSearchResult> {
    let mut kept: Vec<HybridSearchResult> = Vec::new();
    let mut kept_shingles: Vec<HashSet<String>> = Vec::new();
    let mut kept_lengths: Vec<usize> = Vec::new();

    for (index, candidate) in results.into_iter().enumerate() {
        let content = candidate.content.as_deref().unwrap_or("");
        let cand_shingles = shingles(&tokenize(content));
        let cand_len = content.len();

        if index < config.preserve_top {
            kept_shingles.push(cand_shingles);
            kept_lengths.push(cand_len);
            kept.push(candidate);
            continue;
        }

        let mut is_duplicate = false;
        for (kept_index, kept_shingle_set) in kept_shingles.iter().enumerate() {
            let similarity = jaccard(&cand_shingles, kept_shingle_set);
            if similarity < config.dedup_threshold {
                continue;
            }
            if kept[kept_index].path == candidate.path {
                is_duplicate = true;
                break;
            }
            // Only a longer candidate earns the "prefer longer when paths
            // differ" exception; a candidate no longer than the kept result
            // is still a near-duplicate even on a different path.
            let kept_len = kept_lengths[kept_index];
            let candidate_is_substantially_longer =
                kept_len > 0 && cand_len as f32 > config.dedup_length_ratio * kept_len as f32;
            if !candidate_is_substantially_longer {
                is_duplicate = true;
                break;
            }
        }

        if !is_duplicate {
            kept_shingles.push(cand_shingles);
            kept_lengths.push(cand_len);
            kept.push(candidate);
        }
    }

    kept
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
    fn near_identical_same_path_chunks_are_deduped() {
        let config = PostrankConfig {
            preserve_top: 0,
            ..PostrankConfig::default()
        };
        let results = vec![
            result("a", "a.rs", "fn one two three four five six seven", 1.0),
            result("b", "a.rs", "fn one two three four five six eight", 0.9),
        ];
        let deduped = dedup(results, &config);
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn preserve_top_is_never_dropped() {
        let config = PostrankConfig {
            preserve_top: 2,
            ..PostrankConfig::default()
        };
        let results = vec![
            result("a", "a.rs", "fn one two three four five six seven", 1.0),
            result("b", "a.rs", "fn one two three four five six seven", 0.9),
        ];
        let deduped = dedup(results, &config);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn similar_shingles_across_different_paths_survive_when_lengths_diverge() {
        let config = PostrankConfig {
            preserve_top: 0,
            dedup_length_ratio: 1.1,
            ..PostrankConfig::default()
        };
        let short = "fn one two three four five";
        let long = format!("{short} {}", "padding ".repeat(20));
        let results = vec![result("a", "a.rs", short, 1.0), result("b", "b.rs", &long, 0.9)];
        let deduped = dedup(results, &config);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn a_shorter_candidate_on_a_different_path_is_still_dropped() {
        // The exception only saves a *longer* candidate; a kept result that
        // happens to be the longer side must not shield a shorter one, even
        // though the symmetric length ratio between them clears the
        // threshold either way.
        let config = PostrankConfig {
            preserve_top: 0,
            dedup_threshold: 0.1,
            dedup_length_ratio: 1.5,
            ..PostrankConfig::default()
        };
        let short = "fn one two three four five";
        let long = format!("{short} {}", "padding ".repeat(20));
        let results = vec![result("a", "a.rs", &long, 1.0), result("b", "b.rs", short, 0.9)];
        let deduped = dedup(results, &config);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].doc_id, "a");
    }

    #[test]
    fn unrelated_content_is_never_deduped() {
        let config = PostrankConfig {
            preserve_top: 0,
            ..PostrankConfig::default()
        };
        let results = vec![
            result("a", "a.rs", "completely different alpha beta gamma", 1.0),
            result("b", "b.rs", "nothing shared zeta theta omega", 0.9),
        ];
        let deduped = dedup(results, &config);
        assert_eq!(deduped.len(), 2);
    }
}
