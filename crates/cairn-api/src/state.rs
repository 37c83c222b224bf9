//! Shared application state.

use cairn_sync::ResourceService;

/// Application state shared across handlers.
///
/// The service is the only dependency handlers need: it fronts the
/// registry, the chunk store, and the vector index. The worker runs
/// beside the server and shares the same database, so there is nothing
/// request handlers have to coordinate with directly.
#[derive(Clone)]
pub struct AppState {
    pub service: ResourceService,
}

impl AppState {
    pub fn new(service: ResourceService) -> Self {
        Self { service }
    }
}
