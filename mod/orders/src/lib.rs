pub mod api;
pub mod engine;
pub mod model;
pub mod state;
pub mod workflow;

use std::sync::Arc;

use axum::Router;
use comanda_core::{Module, ServiceError};

use engine::OrderEngine;

/// Orders module — order lifecycle, items, and the shared status machine.
pub struct OrdersModule {
    engine: Arc<OrderEngine>,
}

impl OrdersModule {
    pub fn new(
        kv: Arc<dyn comanda_kv::KVStore>,
        dishes: Arc<comanda_store::KvOps<comanda_catalog::model::Dish>>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            engine: Arc::new(OrderEngine::new(kv, dishes)?),
        })
    }

    pub fn engine(&self) -> &Arc<OrderEngine> {
        &self.engine
    }
}

impl Module for OrdersModule {
    fn name(&self) -> &str {
        "orders"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.engine))
    }
}
