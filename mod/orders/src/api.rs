use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use comanda_core::{ListParams, ServiceError};

use crate::engine::OrderEngine;
use crate::model::{
    AddItemRequest, CreateOrderRequest, Order, SetQuantityRequest, SetStatusRequest,
};
use crate::workflow::{OrderStats, KITCHEN_VIEW, PAYMENT_VIEW};

type S = Arc<OrderEngine>;

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    /// Optional named view: `kitchen` or `payment`.
    view: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl ListQuery {
    fn page(&self) -> ListParams {
        let mut page = ListParams::default();
        if let Some(limit) = self.limit {
            page.limit = limit;
        }
        if let Some(offset) = self.offset {
            page.offset = offset;
        }
        page
    }
}

/// Build the orders router.
///
/// Routes:
/// - `GET    /orders`                        — list orders (`?view=kitchen|payment`, `?limit=&offset=`)
/// - `POST   /orders`                        — create order
/// - `GET    /orders/@stats`                 — per-status counts + revenue
/// - `GET    /orders/:id`                    — get order
/// - `PUT    /orders/:id`                    — merge fields into order
/// - `DELETE /orders/:id`                    — delete order
/// - `PATCH  /orders/:id/status`             — validated status transition
/// - `POST   /orders/:id/items`              — add dish to order
/// - `PATCH  /orders/:id/items/:item_id`     — set item quantity
/// - `DELETE /orders/:id/items/:item_id`     — remove item
pub fn router(engine: S) -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/@stats", get(order_stats))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/orders/{id}/status", patch(set_status))
        .route("/orders/{id}/items", axum::routing::post(add_item))
        .route(
            "/orders/{id}/items/{item_id}",
            patch(set_item_quantity).delete(remove_item),
        )
        .with_state(engine)
}

async fn list_orders(
    State(engine): State<S>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>, ServiceError> {
    let orders = match query.view.as_deref() {
        None => engine.list()?,
        Some("kitchen") => engine.view(KITCHEN_VIEW),
        Some("payment") => engine.view(PAYMENT_VIEW),
        Some(other) => {
            return Err(ServiceError::Validation(format!(
                "unknown view '{}', expected 'kitchen' or 'payment'",
                other
            )))
        }
    };
    Ok(Json(query.page().apply(orders)))
}

async fn order_stats(State(engine): State<S>) -> Json<OrderStats> {
    Json(engine.stats())
}

async fn get_order(
    State(engine): State<S>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(engine.get(&id)?))
}

async fn create_order(
    State(engine): State<S>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(engine.create(req)?))
}

async fn update_order(
    State(engine): State<S>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(engine.update(&id, patch)?))
}

async fn delete_order(
    State(engine): State<S>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    engine.delete(&id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn set_status(
    State(engine): State<S>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(engine.set_status(&id, req.status)?))
}

async fn add_item(
    State(engine): State<S>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(engine.add_item(&id, &req.dish_id, req.quantity)?))
}

async fn set_item_quantity(
    State(engine): State<S>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(engine.set_item_quantity(&id, &item_id, req.quantity)?))
}

async fn remove_item(
    State(engine): State<S>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(engine.remove_item(&id, &item_id)?))
}
