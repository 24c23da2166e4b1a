//! `comandad` — the order management server binary.
//!
//! Usage:
//!   comandad [--listen <addr>] [--data-dir <dir>] [--db <file>] [--seed]
//!
//! Without `--data-dir` (or `--db`) the server keeps everything in memory,
//! the development mode of the original mock server.

mod routes;
mod seed;

use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tracing::{info, warn};

use comanda_catalog::CatalogModule;
use comanda_core::{Module, ServiceError};
use comanda_kitchen::KitchenModule;
use comanda_orders::model::{Order, OrderStatus};
use comanda_orders::OrdersModule;
use comanda_payment::model::Payment;
use comanda_payment::PaymentModule;

/// Order management server.
#[derive(Parser, Debug)]
#[command(name = "comandad", about = "Restaurant order management server")]
struct Cli {
    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,

    /// Directory for persistent data. Omit to run in-memory.
    #[arg(long = "data-dir")]
    data_dir: Option<std::path::PathBuf>,

    /// Path to the redb database file (defaults to {data-dir}/data.redb).
    #[arg(long = "db")]
    db: Option<std::path::PathBuf>,

    /// Load the demo menu when the catalog is empty.
    #[arg(long = "seed")]
    seed: bool,
}

/// The constructed modules, kept alive for the lifetime of the server.
struct AppModules {
    catalog: CatalogModule,
    orders: OrdersModule,
    kitchen: KitchenModule,
    payment: PaymentModule,
}

/// Build every module over a shared store, wire the cross-module triggers,
/// and collect the routes.
fn assemble(kv: Arc<dyn comanda_kv::KVStore>) -> Result<(Router, AppModules), ServiceError> {
    let catalog = CatalogModule::new(Arc::clone(&kv));
    let orders = OrdersModule::new(Arc::clone(&kv), Arc::clone(catalog.service().dishes()))?;
    let kitchen = KitchenModule::new(Arc::clone(&kv));
    let payment = PaymentModule::new(Arc::clone(&kv));

    // Orders reaching PREPARING go onto the kitchen board. A failed intake
    // never fails the status change itself.
    let kitchen_svc = Arc::clone(kitchen.service());
    orders.engine().set_kitchen_trigger(Arc::new(move |order: &Order| {
        if let Err(e) = kitchen_svc.intake(order) {
            warn!(order_id = %order.id, error = %e, "kitchen intake failed");
        }
    }));

    // Kitchen ticket status changes flow back to the source order.
    let engine = Arc::clone(orders.engine());
    kitchen
        .service()
        .set_order_sync(Arc::new(move |order_id: &str, status: OrderStatus| {
            if let Err(e) = engine.set_status(order_id, status) {
                warn!(order_id, to = %status, error = %e, "order status sync failed");
            }
        }));

    // The fully-paid check compares against the order total.
    let engine = Arc::clone(orders.engine());
    payment
        .service()
        .set_order_total_lookup(Arc::new(move |order_id: &str| {
            engine.get(order_id).ok().map(|order| order.total_amount)
        }));

    // Completed payments mark the order PAID.
    let engine = Arc::clone(orders.engine());
    payment
        .service()
        .set_completion_trigger(Arc::new(move |payment: &Payment| {
            if let Err(e) = engine.set_status(&payment.order_id, OrderStatus::Paid) {
                warn!(
                    order_id = %payment.order_id,
                    payment_id = %payment.id,
                    error = %e,
                    "marking order paid failed"
                );
            }
        }));

    let module_routes = vec![
        (catalog.name(), catalog.routes()),
        (orders.name(), orders.routes()),
        (kitchen.name(), kitchen.routes()),
        (payment.name(), payment.routes()),
    ];
    let router = routes::build_router(module_routes);

    Ok((
        router,
        AppModules {
            catalog,
            orders,
            kitchen,
            payment,
        },
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = comanda_core::ServiceConfig {
        data_dir: cli.data_dir.clone(),
        db_path: cli.db.clone(),
        listen: cli.listen.clone(),
    };

    // Initialize storage (shared by all modules).
    let kv: Arc<dyn comanda_kv::KVStore> = match config.resolve_db_path() {
        Some(path) => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            info!("Opening database at {}", path.display());
            Arc::new(
                comanda_kv::RedbStore::open(&path)
                    .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
            )
        }
        None => {
            info!("No data directory configured, running in-memory");
            Arc::new(comanda_kv::MemStore::new())
        }
    };

    let (app, modules) = assemble(kv)?;
    info!(
        "Modules initialized: {}, {}, {}, {}",
        modules.catalog.name(),
        modules.orders.name(),
        modules.kitchen.name(),
        modules.payment.name()
    );

    if cli.seed {
        seed::seed_dishes(modules.catalog.service())?;
    }

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("comandad listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
