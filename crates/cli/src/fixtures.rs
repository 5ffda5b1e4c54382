//! Loads a JSON corpus file into the in-memory sparse and dense reference
//! indexes, since ingestion and persistence are out of scope for this
//! crate: serving still needs some source of chunks, and a flat fixture
//! file is the simplest stand-in.

use std::path::Path;
use std::sync::Arc;

use hybridsearch_core::model::Chunk;
use hybridsearch_core::traits::EmbeddingProvider;
use hybridsearch_retrieval::{InMemoryDenseIndex, InMemorySparseIndex};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    stores: Vec<FixtureStore>,
}

#[derive(Debug, Deserialize)]
struct FixtureStore {
    name: String,
    chunks: Vec<Chunk>,
}

/// Reads `path` as a JSON document of the shape
/// `{"stores": [{"name": "demo", "chunks": [...]}]}` and indexes every
/// chunk into both the sparse and dense in-memory indexes, embedding each
/// chunk's content with `embedder`. Returns the set of store names loaded.
pub async fn load_into_indexes(
    path: &Path,
    sparse: &Arc<InMemorySparseIndex>,
    dense: &Arc<InMemoryDenseIndex>,
    embedder: &Arc<dyn EmbeddingProvider>,
) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    let fixture: FixtureFile = serde_json::from_str(&raw)?;

    let mut loaded = Vec::with_capacity(fixture.stores.len());
    for store in fixture.stores {
        let mut dense_entries = Vec::with_capacity(store.chunks.len());
        for chunk in &store.chunks {
            let embedding = embedder.embed_query(&chunk.content).await?;
            dense_entries.push((chunk.clone(), embedding));
        }

        sparse.index_store(&store.name, store.chunks);
        dense.index_store(&store.name, dense_entries);
        loaded.push(store.name);
    }

    Ok(loaded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(doc_id: &str) -> Chunk {
        Chunk {
            doc_id: doc_id.to_string(),
            store: "demo".to_string(),
            path: format!("{doc_id}.rs"),
            language: "rust".to_string(),
            start_line: 1,
            end_line: 3,
            content: "fn parseRequest() {}".to_string(),
            symbols: vec!["parseRequest".to_string()],
        }
    }

    #[tokio::test]
    async fn loads_chunks_from_a_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        let contents = serde_json::json!({
            "stores": [{ "name": "demo", "chunks": [chunk("a"), chunk("b")] }]
        });
        std::fs::write(&path, contents.to_string()).unwrap();

        let sparse = Arc::new(InMemorySparseIndex::new());
        let dense = Arc::new(InMemoryDenseIndex::new());
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(hybridsearch_retrieval::DeterministicEmbeddingProvider::default());

        let loaded = load_into_indexes(&path, &sparse, &dense, &embedder)
            .await
            .unwrap();

        assert_eq!(loaded, vec!["demo".to_string()]);
    }
}
