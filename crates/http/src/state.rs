use std::sync::Arc;

use hybridsearch_orchestrator::Orchestrator;

/// Shared application state: one `Arc` handle cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}
