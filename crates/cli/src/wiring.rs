//! Assembles the in-memory reference collaborators into an `Orchestrator`,
//! loading a fixture corpus file when one is given.

use std::path::PathBuf;
use std::sync::Arc;

use hybridsearch_core::config::Config;
use hybridsearch_core::traits::{DenseIndex, EmbeddingProvider, RerankerProvider, SparseIndex, StaticStoreRegistry, StoreRegistry};
use hybridsearch_orchestrator::Orchestrator;
use hybridsearch_reranking::MockRerankerProvider;
use hybridsearch_retrieval::{DeterministicEmbeddingProvider, InMemoryDenseIndex, InMemorySparseIndex};
use hybridsearch_telemetry::TelemetryRecorder;
use tracing::info;

use crate::fixtures;

/// Collaborator wiring knobs exposed on the command line.
pub struct CollaboratorConfig {
    pub config_path: Option<PathBuf>,
    pub fixture_path: Option<PathBuf>,
}

/// Builds an `Orchestrator` over the in-memory reference implementations,
/// optionally loading `fixture_path` into the sparse/dense indexes first.
pub async fn build_orchestrator(options: CollaboratorConfig) -> anyhow::Result<(Arc<Orchestrator>, Vec<String>)> {
    let config = match &options.config_path {
        Some(path) if path.exists() => Config::from_file(path)?,
        _ => Config::default(),
    };
    config.validate()?;

    let sparse = Arc::new(InMemorySparseIndex::new());
    let dense = Arc::new(InMemoryDenseIndex::new());
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(DeterministicEmbeddingProvider::default());
    let reranker: Arc<dyn RerankerProvider> = Arc::new(MockRerankerProvider);

    let stores = if let Some(fixture_path) = &options.fixture_path {
        let loaded = fixtures::load_into_indexes(fixture_path, &sparse, &dense, &embedder).await?;
        info!("loaded {} store(s) from {}", loaded.len(), fixture_path.display());
        loaded
    } else {
        info!("no fixture file given, starting with empty stores");
        Vec::new()
    };

    let registry: Arc<dyn StoreRegistry> = Arc::new(StaticStoreRegistry::new(stores.clone()));
    let telemetry = Arc::new(TelemetryRecorder::new(&config.telemetry));

    let sparse: Arc<dyn SparseIndex> = sparse;
    let dense: Arc<dyn DenseIndex> = dense;

    let orchestrator = Arc::new(Orchestrator::new(
        config, sparse, dense, embedder, reranker, registry, telemetry,
    ));

    Ok((orchestrator, stores))
}
