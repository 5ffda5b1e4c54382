//! Library interface for the hybrid search CLI: `lib.rs` exposes internals
//! for integration tests while `main.rs` owns the binary's control flow.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod fixtures;
pub mod wiring;

pub use wiring::{build_orchestrator, CollaboratorConfig};
