use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use comanda_core::ServiceError;

use crate::model::{
    CardPaymentRequest, CashPaymentRequest, CreatePaymentRequest, Payment, PaymentMethod,
    PaymentStatus, PixPaymentRequest, RevenueQuery, RevenueReport, SetNotesRequest,
    SetStatusRequest,
};
use crate::service::PaymentService;

type S = Arc<PaymentService>;

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    status: Option<String>,
    method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ByOrderQuery {
    /// When true, only COMPLETED payments.
    #[serde(default)]
    completed: bool,
}

/// Build the payments router.
///
/// Routes:
/// - `GET    /payments`                    — list (`?status=`, `?method=`)
/// - `POST   /payments`                    — create payment
/// - `GET    /payments/@revenue`           — COMPLETED total (`?from=&to=`)
/// - `GET    /payments/order/:order_id`    — by order (`?completed=true`)
/// - `GET    /payments/order/:order_id/fully-paid` — COMPLETED sum covers the order
/// - `GET    /payments/processed-by/:user` — by processing user
/// - `GET    /payments/:id`                — get payment
/// - `DELETE /payments/:id`                — delete payment
/// - `PATCH  /payments/:id/status|notes`
/// - `POST   /payments/:id/@cash|@card|@pix`
pub fn router(svc: S) -> Router {
    Router::new()
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/@revenue", get(revenue))
        .route("/payments/order/{order_id}", get(list_by_order))
        .route("/payments/order/{order_id}/fully-paid", get(fully_paid))
        .route("/payments/processed-by/{user}", get(list_by_processed_by))
        .route("/payments/{id}", get(get_payment).delete(delete_payment))
        .route("/payments/{id}/status", patch(set_status))
        .route("/payments/{id}/notes", patch(set_notes))
        .route("/payments/{id}/@cash", post(process_cash))
        .route("/payments/{id}/@card", post(process_card))
        .route("/payments/{id}/@pix", post(process_pix))
        .with_state(svc)
}

async fn list_payments(
    State(svc): State<S>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Payment>>, ServiceError> {
    let payments = match (query.status.as_deref(), query.method.as_deref()) {
        (Some(s), _) => {
            let status = PaymentStatus::from_str(&s.to_ascii_uppercase())
                .ok_or_else(|| ServiceError::Validation(format!("unknown payment status '{}'", s)))?;
            svc.list_by_status(status)?
        }
        (None, Some(m)) => {
            let method = PaymentMethod::from_str(&m.to_ascii_uppercase())
                .ok_or_else(|| ServiceError::Validation(format!("unknown payment method '{}'", m)))?;
            svc.list_by_method(method)?
        }
        (None, None) => svc.list()?,
    };
    Ok(Json(payments))
}

async fn list_by_order(
    State(svc): State<S>,
    Path(order_id): Path<String>,
    Query(query): Query<ByOrderQuery>,
) -> Result<Json<Vec<Payment>>, ServiceError> {
    let payments = if query.completed {
        svc.completed_by_order(&order_id)?
    } else {
        svc.list_by_order(&order_id)?
    };
    Ok(Json(payments))
}

async fn fully_paid(
    State(svc): State<S>,
    Path(order_id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let fully_paid = svc.order_fully_paid(&order_id)?;
    Ok(Json(serde_json::json!({ "fullyPaid": fully_paid })))
}

async fn list_by_processed_by(
    State(svc): State<S>,
    Path(user): Path<String>,
) -> Result<Json<Vec<Payment>>, ServiceError> {
    Ok(Json(svc.list_by_processed_by(&user)?))
}

async fn revenue(
    State(svc): State<S>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueReport>, ServiceError> {
    Ok(Json(svc.revenue(query)?))
}

async fn get_payment(
    State(svc): State<S>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(svc.get(&id)?))
}

async fn create_payment(
    State(svc): State<S>,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(svc.create(req)?))
}

async fn delete_payment(
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
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(svc.set_status(&id, req.status)?))
}

async fn set_notes(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(req): Json<SetNotesRequest>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(svc.set_notes(&id, req.notes)?))
}

async fn process_cash(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(req): Json<CashPaymentRequest>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(svc.process_cash(&id, req)?))
}

async fn process_card(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(req): Json<CardPaymentRequest>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(svc.process_card(&id, req)?))
}

async fn process_pix(
    State(svc): State<S>,
    Path(id): Path<String>,
    Json(req): Json<PixPaymentRequest>,
) -> Result<Json<Payment>, ServiceError> {
    Ok(Json(svc.process_pix(&id, req)?))
}
