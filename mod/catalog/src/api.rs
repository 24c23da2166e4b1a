use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use comanda_core::{ListParams, ServiceError};

use crate::model::{CreateDishRequest, Dish};
use crate::service::CatalogService;

type S = Arc<CatalogService>;

/// Build the catalog router.
///
/// Routes:
/// - `GET    /dishes`      — list dishes (`?limit=&offset=`)
/// - `POST   /dishes`      — create dish
/// - `GET    /dishes/:id`  — get dish
/// - `PUT    /dishes/:id`  — merge fields into dish
/// - `DELETE /dishes/:id`  — delete dish
pub fn router(svc: S) -> Router {
    Router::new()
        .route("/dishes", get(list_dishes).post(create_dish))
        .route("/dishes/{id}", get(get_dish).put(update_dish).delete(delete_dish))
        .with_state(svc)
}

async fn list_dishes(
    State(svc): State<S>,
    Query(page): Query<ListParams>,
) -> Result<Json<Vec<Dish>>, ServiceError> {
    Ok(Json(page.apply(svc.list()?)))
}

async fn get_dish(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<Dish>, ServiceError> {
    Ok(Json(svc.get(&id)?))
}

async fn create_dish(
    State(svc): State<S>,
    Json(req): Json<CreateDishRequest>,
) -> Result<Json<Dish>, ServiceError> {
    Ok(Json(svc.create(req.name, req.description, req.price)?))
}

async fn update_dish(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Dish>, ServiceError> {
    Ok(Json(svc.update(&id, patch)?))
}

async fn delete_dish(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete(&id)?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
