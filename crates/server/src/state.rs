use std::sync::Arc;

use catalogue_pdf::upstream::Upstream;
use catalogue_pdf::CatalogueConfig;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CatalogueConfig>,
    pub upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(config: CatalogueConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }
}
