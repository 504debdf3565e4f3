use std::sync::Arc;

use services::{CatalogService, ProgressService};

/// Shared handler state. Both services are immutable or internally
/// synchronized, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub progress: Arc<ProgressService>,
}

impl AppState {
    #[must_use]
    pub fn new(catalog: CatalogService, progress: ProgressService) -> Self {
        Self {
            catalog: Arc::new(catalog),
            progress: Arc::new(progress),
        }
    }
}
