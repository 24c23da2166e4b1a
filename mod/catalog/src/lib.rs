pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use comanda_core::Module;

use service::CatalogService;

/// Catalog module — the dish half of the order store.
pub struct CatalogModule {
    service: Arc<CatalogService>,
}

impl CatalogModule {
    pub fn new(kv: Arc<dyn comanda_kv::KVStore>) -> Self {
        Self {
            service: Arc::new(CatalogService::new(kv)),
        }
    }

    pub fn service(&self) -> &Arc<CatalogService> {
        &self.service
    }
}

impl Module for CatalogModule {
    fn name(&self) -> &str {
        "catalog"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
