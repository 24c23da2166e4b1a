use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use comanda_core::ServiceError;
use comanda_orders::model::OrderStatus;

use crate::model::{
    CreateKitchenOrderRequest, KitchenOrder, SetEstimatedTimeRequest, SetItemStatusRequest,
    SetNotesRequest, SetPriorityRequest, SetStatusRequest,
};
use crate::service::KitchenService;

type S = Arc<KitchenService>;

/// Build the kitchen router.
///
/// Routes:
/// - `GET    /kitchen/orders`                     — whole board, urgent first
/// - `POST   /kitchen/orders`                     — post a ticket directly
/// - `GET    /kitchen/orders/active`              — NEW/PREPARING/READY
/// - `GET    /kitchen/orders/new|preparing|ready` — single-status shortcuts
/// - `GET    /kitchen/orders/table/:n`            — by table number
/// - `GET    /kitchen/orders/priority/:p`         — by priority 1..=3
/// - `GET    /kitchen/orders/count/:status`       — count for a status
/// - `GET    /kitchen/orders/:id`                 — get ticket
/// - `DELETE /kitchen/orders/:id`                 — remove ticket
/// - `PATCH  /kitchen/orders/:id/status`          — validated transition
/// - `PATCH  /kitchen/orders/:id/priority`
/// - `PATCH  /kitchen/orders/:id/notes`
/// - `PATCH  /kitchen/orders/:id/estimated-time`
/// - `POST   /kitchen/orders/:id/@ready|@delivered|@cancel|@all-items-ready`
/// - `PATCH  /kitchen/orders/:id/items/:item_id/status|notes`
pub fn router(svc: S) -> Router {
    Router::new()
        .route("/kitchen/orders", get(list_board).post(create_ticket))
        .route("/kitchen/orders/active", get(list_active))
        .route("/kitchen/orders/new", get(list_new))
        .route("/kitchen/orders/preparing", get(list_preparing))
        .route("/kitchen/orders/ready", get(list_ready))
        .route("/kitchen/orders/table/{table}", get(list_by_table))
        .route("/kitchen/orders/priority/{priority}", get(list_by_priority))
        .route("/kitchen/orders/count/{status}", get(count_by_status))
        .route("/kitchen/orders/{id}", get(get_ticket).delete(delete_ticket))
        .route("/kitchen/orders/{id}/status", patch(set_status))
        .route("/kitchen/orders/{id}/priority", patch(set_priority))
        .route("/kitchen/orders/{id}/notes", patch(set_notes))
        .route("/kitchen/orders/{id}/estimated-time", patch(set_estimated_time))
        .route("/kitchen/orders/{id}/@ready", post(mark_ready))
        .route("/kitchen/orders/{id}/@delivered", post(mark_delivered))
        .route("/kitchen/orders/{id}/@cancel", post(cancel))
        .route("/kitchen/orders/{id}/@all-items-ready", post(all_items_ready))
        .route("/kitchen/orders/{id}/items/{item_id}/status", patch(set_item_status))
        .route("/kitchen/orders/{id}/items/{item_id}/notes", patch(set_item_notes))
        .with_state(svc)
}

fn parse_status(s: &str) -> Result<OrderStatus, ServiceError> {
    OrderStatus::from_str(&s.to_ascii_uppercase())
        .ok_or_else(|| ServiceError::Validation(format!("unknown order status '{}'", s)))
}

async fn list_board(State(svc): State<S>) -> Result<Json<Vec<KitchenOrder>>, ServiceError> {
    Ok(Json(svc.list()?))
}

async fn list_active(State(svc): State<S>) -> Result<Json<Vec<KitchenOrder>>, ServiceError> {
    Ok(Json(svc.list_active()?))
}

async fn list_new(State(svc): State<S>) -> Result<Json<Vec<KitchenOrder>>, ServiceError> {
    Ok(Json(svc.list_by_status(OrderStatus::New)?))
}

async fn list_preparing(State(svc): State<S>) -> Result<Json<Vec<KitchenOrder>>, ServiceError> {
    Ok(Json(svc.list_by_status(OrderStatus::Preparing)?))
}

async fn list_ready(State(svc): State<S>) -> Result<Json<Vec<KitchenOrder>>, ServiceError> {
    Ok(Json(svc.list_by_status(OrderStatus::Ready)?))
}

async fn list_by_table(
    State(svc): State<S>,
    Path(table): Path<u32>,
) -> Result<Json<Vec<KitchenOrder>>, ServiceError> {
    Ok(Json(svc.list_by_table(table)?))
}

async fn list_by_priority(
    State(svc): State<S>,
    Path(priority): Path<u8>,
) -> Result<Json<Vec<KitchenOrder>>, ServiceError> {
    Ok(Json(svc.list_by_priority(priority)?))
}

async fn count_by_status(
    State(svc): State<S>,
    Path(status): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let status = parse_status(&status)?;
    let count = svc.count_by_status(status)?;
    Ok(Json(serde_json::json!({ "status": status, "count": count })))
}

async fn get_ticket(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.get(&id)?))
}

async fn create_ticket(
    State(svc): State<S>,
    Json(req): Json<CreateKitchenOrderRequest>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.create(req)?))
}

async fn delete_ticket(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete(&id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn set_status(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.set_status(&id, req.status)?))
}

async fn set_priority(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(req): Json<SetPriorityRequest>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.set_priority(&id, req.priority)?))
}

async fn set_notes(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(req): Json<SetNotesRequest>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.set_notes(&id, req.notes)?))
}

async fn set_estimated_time(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(req): Json<SetEstimatedTimeRequest>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.set_estimated_time(&id, req.estimated_time)?))
}

async fn mark_ready(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.mark_ready(&id)?))
}

async fn mark_delivered(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.mark_delivered(&id)?))
}

async fn cancel(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.cancel(&id)?))
}

async fn all_items_ready(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.mark_all_items_ready(&id)?))
}

async fn set_item_status(
    State(svc): State<S>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<SetItemStatusRequest>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.set_item_status(&id, &item_id, req.status)?))
}

async fn set_item_notes(
    State(svc): State<S>,
    Path((id, item_id)): Path<(String, String)>,
    Json(req): Json<SetNotesRequest>,
) -> Result<Json<KitchenOrder>, ServiceError> {
    Ok(Json(svc.set_item_notes(&id, &item_id, req.notes)?))
}
