//! File-level aggregation (C7): groups chunks by path, annotates each with
//! its rank and score within the file, and interleaves files by descending
//! file score.

use std::cmp::Ordering;
use std::collections::HashMap;

use hybridsearch_core::model::{AggregatedResult, HybridSearchResult};

/// Result of [`aggregate_by_file`]: the reordered, annotated results plus how
/// many chunks were truncated by `max_chunks_per_file`.
pub struct AggregationOutcome {
    pub results: Vec<AggregatedResult>,
    pub chunks_dropped: usize,
}

/// `aggregateByFile(results, maxChunksPerFile) -> {results, chunksDropped}`.
///
/// A file's score is the highest `final_score` among its chunks. Within a
/// file, chunks keep their incoming relative order (already ranked by the
/// upstream stages), and only the first `max_chunks_per_file` survive.
pub fn aggregate_by_file(results: Vec<HybridSearchResult>, max_chunks_per_file: usize) -> AggregationOutcome {
    let mut file_order: Vec<String> = Vec::new();
    let mut by_file: HashMap<String, Vec<HybridSearchResult>> = HashMap::new();

    for result in results {
        by_file
            .entry(result.path.clone())
            .or_insert_with(|| {
                file_order.push(result.path.clone());
                Vec::new()
            })
            .push(result);
    }

    let cap = max_chunks_per_file.max(1);
    let mut chunks_dropped = 0;
    let mut file_scores: HashMap<String, f32> = HashMap::new();
    let mut aggregated: HashMap<String, Vec<AggregatedResult>> = HashMap::new();

    for file in &file_order {
        let Some(chunks) = by_file.remove(file) else {
            continue;
        };
        let total = chunks.len();
        let file_score = chunks.iter().map(|c| c.final_score).fold(f32::NEG_INFINITY, f32::max);
        file_scores.insert(file.clone(), file_score);
        chunks_dropped += total.saturating_sub(cap);

        let items: Vec<AggregatedResult> = chunks
            .into_iter()
            .take(cap)
            .enumerate()
            .map(|(rank, chunk)| {
                let mut entry: AggregatedResult = chunk.into();
                entry.is_representative = Some(rank == 0);
                entry.related_chunks = Some(total);
                entry.file_score = Some(file_score);
                entry.chunk_rank_in_file = Some(rank);
                entry
            })
            .collect();

        aggregated.insert(file.clone(), items);
    }

    let mut files_by_score = file_order;
    files_by_score.sort_by(|a, b| {
        file_scores
            .get(b)
            .unwrap_or(&0.0)
            .partial_cmp(file_scores.get(a).unwrap_or(&0.0))
            .unwrap_or(Ordering::Equal)
    });

    let mut output = Vec::new();
    for file in files_by_score {
        if let Some(items) = aggregated.remove(&file) {
            output.extend(items);
        }
    }

    AggregationOutcome {
        results: output,
        chunks_dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(doc_id: &str, path: &str, score: f32) -> HybridSearchResult {
        HybridSearchResult {
            doc_id: doc_id.to_string(),
            path: path.to_string(),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 2,
            content: Some("x".to_string()),
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
    fn first_chunk_per_file_is_representative() {
        let outcome = aggregate_by_file(
            vec![result("a1", "a.rs", 0.9), result("a2", "a.rs", 0.8)],
            10,
        );
        assert_eq!(outcome.results[0].is_representative, Some(true));
        assert_eq!(outcome.results[1].is_representative, Some(false));
        assert_eq!(outcome.results[0].related_chunks, Some(2));
    }

    #[test]
    fn truncates_beyond_max_chunks_per_file_and_tracks_drops() {
        let outcome = aggregate_by_file(
            vec![
                result("a1", "a.rs", 0.9),
                result("a2", "a.rs", 0.8),
                result("a3", "a.rs", 0.7),
            ],
            2,
        );
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.chunks_dropped, 1);
    }

    #[test]
    fn files_interleave_by_descending_file_score() {
        let outcome = aggregate_by_file(
            vec![
                result("a1", "a.rs", 0.5),
                result("b1", "b.rs", 0.9),
            ],
            10,
        );
        assert_eq!(outcome.results[0].result.path, "b.rs");
        assert_eq!(outcome.results[1].result.path, "a.rs");
    }
}
