//! Shared data model, configuration, error type, and collaborator traits for
//! the hybrid code search core.
//!
//! This crate has no I/O of its own; it defines the vocabulary every other
//! crate in the workspace builds against.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod model;
pub mod path_util;
pub mod traits;

pub use config::Config;
pub use error::{Error, Result, ResultExt};
