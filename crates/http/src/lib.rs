//! HTTP and WebSocket transport adapters (C10): an Axum router with
//! CORS/trace layers and OpenAPI docs, plus a tagged-message WebSocket
//! binding.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;
pub mod websocket;

pub use routes::build_router;
pub use state::AppState;
