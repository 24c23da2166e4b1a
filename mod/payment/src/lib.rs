pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use comanda_core::Module;

use service::PaymentService;

/// Payment module — register flows and revenue reporting.
pub struct PaymentModule {
    service: Arc<PaymentService>,
}

impl PaymentModule {
    pub fn new(kv: Arc<dyn comanda_kv::KVStore>) -> Self {
        Self {
            service: Arc::new(PaymentService::new(kv)),
        }
    }

    pub fn service(&self) -> &Arc<PaymentService> {
        &self.service
    }
}

impl Module for PaymentModule {
    fn name(&self) -> &str {
        "payment"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
