pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use comanda_core::Module;

use service::KitchenService;

/// Kitchen module — the ticket board between orders and the pass.
pub struct KitchenModule {
    service: Arc<KitchenService>,
}

impl KitchenModule {
    pub fn new(kv: Arc<dyn comanda_kv::KVStore>) -> Self {
        Self {
            service: Arc::new(KitchenService::new(kv)),
        }
    }

    pub fn service(&self) -> &Arc<KitchenService> {
        &self.service
    }
}

impl Module for KitchenModule {
    fn name(&self) -> &str {
        "kitchen"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
