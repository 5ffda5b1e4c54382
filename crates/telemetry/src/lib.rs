//! Telemetry recorder (C8): a bounded ring buffer of per-query structured
//! records, fanned out to live subscribers.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod recorder;

pub use recorder::TelemetryRecorder;
pub use hybridsearch_core::model::compute_score_stats;
