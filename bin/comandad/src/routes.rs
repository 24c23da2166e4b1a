//! Route registration — collects all module routes + system endpoints.

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tracing::info;

/// Build the complete router with all routes.
///
/// Module routers already carry their own path prefixes and state, so they
/// merge at the root rather than nesting.
pub fn build_router(module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    for (name, router) in module_routes {
        app = app.merge(router);
        info!("mounted {} module routes", name);
    }
    app
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "comandad",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// End-to-end tests over the assembled router
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let kv: Arc<dyn comanda_kv::KVStore> = Arc::new(comanda_kv::MemStore::new());
        let (router, _) = crate::assemble(kv).unwrap();
        router
    }

    async fn api_call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
            None => Body::empty(),
        };
        let req = builder.body(body).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null))
        };
        (status, json)
    }

    #[tokio::test]
    async fn system_endpoints() {
        let app = test_app();
        let (status, body) = api_call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = api_call(&app, "GET", "/version", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "comandad");
    }

    #[tokio::test]
    async fn full_service_flow() {
        let app = test_app();

        // Put a dish on the menu.
        let (status, dish) = api_call(
            &app,
            "POST",
            "/dishes",
            Some(serde_json::json!({"name": "Pizza Margherita", "price": 25.90})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let dish_id = dish["id"].as_str().unwrap().to_string();

        // Open an order for Ana and add two pizzas.
        let (status, order) = api_call(
            &app,
            "POST",
            "/orders",
            Some(serde_json::json!({"customerName": "Ana", "tableNumber": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["status"], "NEW");
        let order_id = order["id"].as_str().unwrap().to_string();

        let (status, order) = api_call(
            &app,
            "POST",
            &format!("/orders/{}/items", order_id),
            Some(serde_json::json!({"dishId": dish_id, "quantity": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["totalAmount"], 51.80);

        // Send to the kitchen; the ticket appears on the board.
        let (status, _) = api_call(
            &app,
            "PATCH",
            &format!("/orders/{}/status", order_id),
            Some(serde_json::json!({"status": "PREPARING"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, board) = api_call(&app, "GET", "/kitchen/orders/active", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board.as_array().unwrap().len(), 1);
        let ticket_id = board[0]["id"].as_str().unwrap().to_string();
        assert_eq!(board[0]["orderId"], order_id.as_str());

        // Kitchen finishes; the order follows to READY.
        let (status, ticket) = api_call(
            &app,
            "POST",
            &format!("/kitchen/orders/{}/@all-items-ready", ticket_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ticket["status"], "READY");

        let (_, order) = api_call(&app, "GET", &format!("/orders/{}", order_id), None).await;
        assert_eq!(order["status"], "READY");

        // Settle in cash; the order follows to PAID.
        let (status, payment) = api_call(
            &app,
            "POST",
            "/payments",
            Some(serde_json::json!({
                "orderId": order_id, "amount": 51.80, "method": "CASH"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let payment_id = payment["id"].as_str().unwrap().to_string();

        let (_, coverage) = api_call(
            &app,
            "GET",
            &format!("/payments/order/{}/fully-paid", order_id),
            None,
        )
        .await;
        assert_eq!(coverage["fullyPaid"], false);

        let (status, payment) = api_call(
            &app,
            "POST",
            &format!("/payments/{}/@cash", payment_id),
            Some(serde_json::json!({"cashReceived": 60.0, "processedBy": "maria"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payment["status"], "COMPLETED");
        assert_eq!(payment["changeAmount"], 8.20);

        let (_, order) = api_call(&app, "GET", &format!("/orders/{}", order_id), None).await;
        assert_eq!(order["status"], "PAID");

        let (_, coverage) = api_call(
            &app,
            "GET",
            &format!("/payments/order/{}/fully-paid", order_id),
            None,
        )
        .await;
        assert_eq!(coverage["fullyPaid"], true);

        let (_, by_user) = api_call(&app, "GET", "/payments/processed-by/maria", None).await;
        assert_eq!(by_user.as_array().unwrap().len(), 1);

        // Both revenue figures agree.
        let (_, stats) = api_call(&app, "GET", "/orders/@stats", None).await;
        assert_eq!(stats["paid"], 1);
        assert_eq!(stats["revenue"], 51.80);

        let (_, revenue) = api_call(&app, "GET", "/payments/@revenue", None).await;
        assert_eq!(revenue["total"], 51.80);
        assert_eq!(revenue["completedCount"], 1);
    }

    #[tokio::test]
    async fn errors_carry_stable_codes() {
        let app = test_app();

        let (status, body) = api_call(&app, "GET", "/orders/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        // Illegal transition on a fresh empty order.
        let (_, order) = api_call(&app, "POST", "/orders", Some(serde_json::json!({}))).await;
        let order_id = order["id"].as_str().unwrap();
        let (status, body) = api_call(
            &app,
            "PATCH",
            &format!("/orders/{}/status", order_id),
            Some(serde_json::json!({"status": "PREPARING"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn resending_order_replaces_kitchen_ticket() {
        let app = test_app();

        let (_, dish) = api_call(
            &app,
            "POST",
            "/dishes",
            Some(serde_json::json!({"name": "Burger", "price": 18.50})),
        )
        .await;
        let dish_id = dish["id"].as_str().unwrap().to_string();

        let (_, order) = api_call(&app, "POST", "/orders", Some(serde_json::json!({}))).await;
        let order_id = order["id"].as_str().unwrap().to_string();
        api_call(
            &app,
            "POST",
            &format!("/orders/{}/items", order_id),
            Some(serde_json::json!({"dishId": dish_id, "quantity": 1})),
        )
        .await;
        api_call(
            &app,
            "PATCH",
            &format!("/orders/{}/status", order_id),
            Some(serde_json::json!({"status": "PREPARING"})),
        )
        .await;

        // Second order also hits the kitchen; each keeps one ticket.
        let (_, other) = api_call(&app, "POST", "/orders", Some(serde_json::json!({}))).await;
        let other_id = other["id"].as_str().unwrap().to_string();
        api_call(
            &app,
            "POST",
            &format!("/orders/{}/items", other_id),
            Some(serde_json::json!({"dishId": dish_id, "quantity": 2})),
        )
        .await;
        api_call(
            &app,
            "PATCH",
            &format!("/orders/{}/status", other_id),
            Some(serde_json::json!({"status": "PREPARING"})),
        )
        .await;

        let (_, board) = api_call(&app, "GET", "/kitchen/orders", None).await;
        assert_eq!(board.as_array().unwrap().len(), 2);
    }
}
