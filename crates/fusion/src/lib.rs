//! Hybrid ranker (C5): weighted reciprocal rank fusion with code-aware
//! bonuses.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod rrf;

pub use rrf::{compute_fusion_stats, fuse, FuseOptions};
