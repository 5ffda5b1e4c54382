//! Retriever drivers (C4): sparse (BM25) and dense (ANN) search, run
//! concurrently, plus in-memory reference implementations of the
//! `SparseIndex`/`DenseIndex`/`EmbeddingProvider` collaborator traits.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod code_tokenizer;
pub mod deterministic_embedding;
pub mod drivers;
pub mod in_memory_dense;
pub mod in_memory_sparse;

pub use deterministic_embedding::DeterministicEmbeddingProvider;
pub use drivers::{dense_search, run_retrievers, sparse_search, DenseOutcome};
pub use in_memory_dense::InMemoryDenseIndex;
pub use in_memory_sparse::InMemorySparseIndex;
