//! Strategy selector (C3).
//!
//! `select(intent) -> RetrievalConfig`, then `adjust(config, intent)` for
//! difficulty, then `override(config, userOverrides)` for caller overrides.

use hybridsearch_core::config::{Strategy, StrategyConfig};
use hybridsearch_core::model::{Difficulty, Intent, RetrievalConfig};

/// User-supplied overrides from a `SearchRequest`. Each present
/// field replaces the corresponding resolved field; `enable_reranking=false`
/// additionally zeroes `rerank_candidates` and forces `use_second_pass=false`.
#[derive(Debug, Clone, Default)]
pub struct StrategyOverrides {
    pub sparse_weight: Option<f32>,
    pub dense_weight: Option<f32>,
    pub rerank_candidates: Option<usize>,
    pub enable_reranking: Option<bool>,
}

fn strategy_for_intent(intent: Intent) -> Strategy {
    match intent {
        Intent::Navigational => Strategy::SparseOnly,
        Intent::Factual => Strategy::Balanced,
        Intent::Exploratory => Strategy::DenseHeavy,
        Intent::Analytical => Strategy::DeepRerank,
    }
}

/// Runs `select -> adjust -> override` and returns the final `RetrievalConfig`.
pub fn resolve(
    config: &StrategyConfig,
    intent: Intent,
    difficulty: Difficulty,
    overrides: &StrategyOverrides,
) -> RetrievalConfig {
    let strategy = strategy_for_intent(intent);
    let preset = config.preset(strategy);

    let mut resolved = RetrievalConfig {
        strategy,
        sparse_top_k: preset.sparse_top_k,
        dense_top_k: preset.dense_top_k,
        sparse_weight: preset.sparse_weight,
        dense_weight: preset.dense_weight,
        rerank_candidates: preset.rerank_candidates,
        use_second_pass: preset.use_second_pass,
        second_pass_candidates: preset.second_pass_candidates,
    };

    adjust_for_difficulty(&mut resolved, difficulty, config);
    apply_overrides(&mut resolved, overrides);
    normalize_invalid_combinations(&mut resolved);

    resolved
}

/// Invalid combinations (e.g. `sparse-only` with `denseWeight > 0`, perhaps
/// introduced by a user override) are normalized here rather than rejected,
/// per the design notes on dynamic-typed request bodies.
fn normalize_invalid_combinations(resolved: &mut RetrievalConfig) {
    if resolved.strategy == Strategy::SparseOnly {
        resolved.dense_top_k = 0;
        resolved.dense_weight = 0.0;
    }
}

fn adjust_for_difficulty(resolved: &mut RetrievalConfig, difficulty: Difficulty, config: &StrategyConfig) {
    match difficulty {
        Difficulty::Easy => {
            resolved.sparse_top_k = scale(resolved.sparse_top_k, config.easy_multiplier);
            resolved.dense_top_k = scale(resolved.dense_top_k, config.easy_multiplier);
            resolved.rerank_candidates = scale(resolved.rerank_candidates, config.easy_multiplier);
            resolved.second_pass_candidates =
                scale(resolved.second_pass_candidates, config.easy_multiplier);
            resolved.use_second_pass = false;
        }
        Difficulty::Hard => {
            resolved.sparse_top_k =
                scale(resolved.sparse_top_k, config.hard_multiplier).min(config.max_sparse_top_k);
            resolved.dense_top_k =
                scale(resolved.dense_top_k, config.hard_multiplier).min(config.max_dense_top_k);
            resolved.rerank_candidates = scale(resolved.rerank_candidates, config.hard_multiplier)
                .min(config.max_rerank_candidates);
            resolved.second_pass_candidates =
                scale(resolved.second_pass_candidates, config.hard_multiplier);
            if resolved.strategy != Strategy::SparseOnly {
                resolved.use_second_pass = true;
            }
        }
        Difficulty::Medium => {}
    }

    if resolved.strategy == Strategy::SparseOnly {
        resolved.use_second_pass = false;
    }
}

fn scale(value: usize, factor: f32) -> usize {
    ((value as f32) * factor).round() as usize
}

fn apply_overrides(resolved: &mut RetrievalConfig, overrides: &StrategyOverrides) {
    if let Some(sparse_weight) = overrides.sparse_weight {
        resolved.sparse_weight = sparse_weight;
    }
    if let Some(dense_weight) = overrides.dense_weight {
        resolved.dense_weight = dense_weight;
    }
    if let Some(rerank_candidates) = overrides.rerank_candidates {
        resolved.rerank_candidates = rerank_candidates;
    }
    if overrides.enable_reranking == Some(false) {
        resolved.rerank_candidates = 0;
        resolved.use_second_pass = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigational_selects_sparse_only_with_zero_dense() {
        let config = StrategyConfig::default();
        let resolved = resolve(&config, Intent::Navigational, Difficulty::Medium, &StrategyOverrides::default());
        assert_eq!(resolved.strategy, Strategy::SparseOnly);
        assert_eq!(resolved.dense_top_k, 0);
        assert_eq!(resolved.sparse_weight, 1.0);
    }

    #[test]
    fn analytical_selects_deep_rerank_with_second_pass() {
        let config = StrategyConfig::default();
        let resolved = resolve(&config, Intent::Analytical, Difficulty::Medium, &StrategyOverrides::default());
        assert_eq!(resolved.strategy, Strategy::DeepRerank);
        assert!(resolved.use_second_pass);
    }

    #[test]
    fn easy_difficulty_shrinks_candidates_and_disables_second_pass() {
        let config = StrategyConfig::default();
        let resolved = resolve(&config, Intent::Analytical, Difficulty::Easy, &StrategyOverrides::default());
        assert!(!resolved.use_second_pass);
        assert!(resolved.sparse_top_k < config.preset(Strategy::DeepRerank).sparse_top_k);
    }

    #[test]
    fn hard_difficulty_enables_second_pass_for_non_sparse_only() {
        let config = StrategyConfig::default();
        let resolved = resolve(&config, Intent::Factual, Difficulty::Hard, &StrategyOverrides::default());
        assert!(resolved.use_second_pass);
    }

    #[test]
    fn hard_difficulty_caps_candidate_counts() {
        let config = StrategyConfig::default();
        let resolved = resolve(&config, Intent::Analytical, Difficulty::Hard, &StrategyOverrides::default());
        assert!(resolved.sparse_top_k <= config.max_sparse_top_k);
        assert!(resolved.rerank_candidates <= config.max_rerank_candidates);
    }

    #[test]
    fn hard_difficulty_never_reenables_dense_for_sparse_only() {
        let config = StrategyConfig::default();
        let resolved = resolve(&config, Intent::Navigational, Difficulty::Hard, &StrategyOverrides::default());
        assert_eq!(resolved.dense_top_k, 0);
    }

    #[test]
    fn disable_reranking_override_zeroes_candidates() {
        let config = StrategyConfig::default();
        let overrides = StrategyOverrides {
            enable_reranking: Some(false),
            ..Default::default()
        };
        let resolved = resolve(&config, Intent::Analytical, Difficulty::Medium, &overrides);
        assert_eq!(resolved.rerank_candidates, 0);
        assert!(!resolved.use_second_pass);
    }

    #[test]
    fn dense_weight_override_is_normalized_away_for_sparse_only() {
        let config = StrategyConfig::default();
        let overrides = StrategyOverrides {
            dense_weight: Some(0.4),
            ..Default::default()
        };
        let resolved = resolve(&config, Intent::Navigational, Difficulty::Medium, &overrides);
        assert_eq!(resolved.dense_weight, 0.0);
        assert_eq!(resolved.dense_top_k, 0);
    }

    #[test]
    fn weight_overrides_replace_preset_weights() {
        let config = StrategyConfig::default();
        let overrides = StrategyOverrides {
            sparse_weight: Some(0.9),
            dense_weight: Some(0.1),
            ..Default::default()
        };
        let resolved = resolve(&config, Intent::Factual, Difficulty::Medium, &overrides);
        assert_eq!(resolved.sparse_weight, 0.9);
        assert_eq!(resolved.dense_weight, 0.1);
    }
}
