use crate::error::{Error, Result};
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Top-level configuration for the hybrid search core, loaded once at startup.
///
/// Every default below is a contract named in the component design, not a
/// tuning suggestion — callers may override via `HYBRIDSEARCH_` environment
/// variables or per-request overrides, but the shipped defaults must match
/// these values exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub strategy: StrategyConfig,
    pub reranking: RerankingConfig,
    pub postrank: PostrankConfig,
    pub telemetry: TelemetryConfig,
    pub cache: CacheConfig,
    pub request: RequestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            reranking: RerankingConfig::default(),
            postrank: PostrankConfig::default(),
            telemetry: TelemetryConfig::default(),
            cache: CacheConfig::default(),
            request: RequestConfig::default(),
        }
    }
}

/// One row of the strategy preset table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StrategyPreset {
    pub sparse_top_k: usize,
    pub dense_top_k: usize,
    pub sparse_weight: f32,
    pub dense_weight: f32,
    pub rerank_candidates: usize,
    pub use_second_pass: bool,
    pub second_pass_candidates: usize,
}

/// Strategy selection configuration: presets, RRF constant, bonus weights,
/// and the caps difficulty adjustment may not exceed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub rrf_k: usize,
    pub symbol_bonus: f32,
    pub symbol_bonus_cap: f32,
    pub path_token_bonus: f32,
    pub language_bonus: f32,
    pub max_sparse_top_k: usize,
    pub max_dense_top_k: usize,
    pub max_rerank_candidates: usize,
    pub easy_multiplier: f32,
    pub hard_multiplier: f32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            rrf_k: 60,
            symbol_bonus: 0.02,
            symbol_bonus_cap: 0.06,
            path_token_bonus: 0.01,
            language_bonus: 0.01,
            max_sparse_top_k: 300,
            max_dense_top_k: 300,
            max_rerank_candidates: 150,
            easy_multiplier: 0.6,
            hard_multiplier: 1.5,
        }
    }
}

impl StrategyConfig {
    /// The fixed preset table, before difficulty adjustment or user
    /// overrides are applied.
    pub fn preset(&self, strategy: Strategy) -> StrategyPreset {
        match strategy {
            Strategy::SparseOnly => StrategyPreset {
                sparse_top_k: 50,
                dense_top_k: 0,
                sparse_weight: 1.0,
                dense_weight: 0.0,
                rerank_candidates: 10,
                use_second_pass: false,
                second_pass_candidates: 0,
            },
            Strategy::Balanced => StrategyPreset {
                sparse_top_k: 80,
                dense_top_k: 80,
                sparse_weight: 0.5,
                dense_weight: 0.5,
                rerank_candidates: 30,
                use_second_pass: false,
                second_pass_candidates: 0,
            },
            Strategy::DenseHeavy => StrategyPreset {
                sparse_top_k: 60,
                dense_top_k: 120,
                sparse_weight: 0.3,
                dense_weight: 0.7,
                rerank_candidates: 50,
                use_second_pass: false,
                second_pass_candidates: 20,
            },
            Strategy::DeepRerank => StrategyPreset {
                sparse_top_k: 150,
                dense_top_k: 150,
                sparse_weight: 0.4,
                dense_weight: 0.6,
                rerank_candidates: 100,
                use_second_pass: true,
                second_pass_candidates: 30,
            },
        }
    }
}

/// `RetrievalConfig.strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum Strategy {
    SparseOnly,
    Balanced,
    DenseHeavy,
    DeepRerank,
}

/// Multi-pass reranker timing and early-exit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankingConfig {
    pub pass1_timeout_ms: u64,
    pub pass2_timeout_ms: u64,
    pub pass1_output_size: usize,
    pub early_exit_score_ratio: f32,
    pub early_exit_score_gap: f32,
    pub top_cluster_ratio: f32,
    pub peaked_variance_threshold: f32,
    pub flat_variance_threshold: f32,
}

impl Default for RerankingConfig {
    fn default() -> Self {
        Self {
            pass1_timeout_ms: 80,
            pass2_timeout_ms: 150,
            pass1_output_size: 30,
            early_exit_score_ratio: 1.5,
            early_exit_score_gap: 0.3,
            top_cluster_ratio: 0.9,
            peaked_variance_threshold: 0.1,
            flat_variance_threshold: 0.05,
        }
    }
}

/// Post-rank pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostrankConfig {
    pub dedup_threshold: f32,
    pub preserve_top: usize,
    pub dedup_length_ratio: f32,
    pub diversity_lambda: f32,
    pub max_chunks_per_file: usize,
}

impl Default for PostrankConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: 0.85,
            preserve_top: 3,
            dedup_length_ratio: 1.5,
            diversity_lambda: 0.7,
            max_chunks_per_file: 3,
        }
    }
}

/// Telemetry ring buffer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub ring_buffer_size: usize,
    pub broadcast_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            ring_buffer_size: 10_000,
            broadcast_capacity: 1024,
        }
    }
}

/// Embedding- and rerank-cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub embedding_cache_capacity: u64,
    pub rerank_cache_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            embedding_cache_capacity: 10_000,
            rerank_cache_capacity: 10_000,
        }
    }
}

/// Per-request defaults and deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub default_top_k: usize,
    pub max_top_k: usize,
    pub request_deadline_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            default_top_k: 20,
            max_top_k: 100,
            request_deadline_ms: 2000,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `HYBRIDSEARCH_` and use double
    /// underscores for nested values, e.g. `HYBRIDSEARCH_STRATEGY__RRF_K=40`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("HYBRIDSEARCH")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing).
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("failed to parse TOML: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.request.default_top_k == 0 || self.request.default_top_k > self.request.max_top_k
        {
            return Err(Error::config(format!(
                "default_top_k ({}) must be in 1..={}",
                self.request.default_top_k, self.request.max_top_k
            )));
        }
        if !(0.0..=1.0).contains(&self.postrank.diversity_lambda) {
            return Err(Error::config("diversity_lambda must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.postrank.dedup_threshold) {
            return Err(Error::config("dedup_threshold must be in [0, 1]"));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, toml_string)
            .map_err(|e| Error::config(format!("failed to write config file: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn sparse_only_preset_has_zero_dense_top_k() {
        let cfg = StrategyConfig::default();
        let preset = cfg.preset(Strategy::SparseOnly);
        assert_eq!(preset.dense_top_k, 0);
        assert_eq!(preset.sparse_weight, 1.0);
    }

    #[test]
    fn from_toml_str_round_trips_overrides() {
        let cfg = Config::from_toml_str(
            r#"
            [strategy]
            rrf_k = 40
            "#,
        )
        .unwrap();
        assert_eq!(cfg.strategy.rrf_k, 40);
        assert_eq!(cfg.strategy.symbol_bonus, 0.02);
    }

    #[test]
    fn invalid_diversity_lambda_fails_validation() {
        let mut cfg = Config::default();
        cfg.postrank.diversity_lambda = 1.5;
        assert!(cfg.validate().is_err());
    }
}
