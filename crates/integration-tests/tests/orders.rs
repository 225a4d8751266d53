//! `GET /api/orders` and `GET /api/orders/{id}` against the fake backend.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use ecomify_integration_tests::{TEST_USER_ID, TestApp};

const OTHER_USER_ID: &str = "9a0d4e77-51c3-4b0e-8f36-0c2b7d9e4a20";

fn order(id: i32, user_id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "status": status,
        "payment_status": "paid",
        "payment_method": "pix",
        "items": [
            { "product_id": 7, "name": "Fone JBL Tune 520BT", "quantity": 2, "unit_price": "249.90" },
            { "product_id": 3, "name": "Mouse Logitech MX Master 3S", "quantity": 1, "unit_price": "599.00" },
        ],
        "subtotal": "1098.80",
        "discount": "0",
        "shipping": "0",
        "total": "1098.80",
        "tracking_code": "BR123456789BR",
        "created_at": "2026-09-14T13:05:00Z",
    })
}

async fn app_with_orders() -> TestApp {
    let app = TestApp::spawn().await;
    app.backend.add_order(order(1042, TEST_USER_ID, "shipped"));
    app.backend.add_order(order(2001, OTHER_USER_ID, "processing"));
    app
}

#[tokio::test]
async fn test_own_order_has_status_display_and_timeline() {
    let app = app_with_orders().await;
    app.sign_in().await;

    let (status, body) = app.get_json("/api/orders/1042").await;

    assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
    assert_eq!(body["id"], 1042);
    assert_eq!(body["user_id"], TEST_USER_ID);
    assert_eq!(body["status_display"]["label"], "Enviado");
    assert_eq!(body["status_display"]["step"], 4);
    assert_eq!(body["status_display"]["can_cancel"], false);
    assert_eq!(body["payment_label"], "Pago");
    assert_eq!(body["item_count"], 3);

    let timeline = body["timeline"].as_array().unwrap();
    assert_eq!(timeline.len(), 5);
    assert_eq!(timeline[2]["state"], "completed");
    assert_eq!(timeline[3], json!({ "label": "Enviado", "state": "current" }));
    assert_eq!(timeline[4]["state"], "upcoming");
}

#[tokio::test]
async fn test_someone_elses_order_is_not_found() {
    let app = app_with_orders().await;
    app.sign_in().await;

    let (status, body) = app.get_json("/api/orders/2001").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Order not found" }));
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let app = app_with_orders().await;
    app.sign_in().await;

    let (status, body) = app.get_json("/api/orders/9999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Order not found" }));
}

#[tokio::test]
async fn test_order_history_lists_only_own_orders() {
    let app = app_with_orders().await;
    app.sign_in().await;

    let (status, body) = app.get_json("/api/orders").await;

    assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], 1042);
}

#[tokio::test]
async fn test_order_detail_requires_sign_in() {
    let app = app_with_orders().await;

    let (status, body) = app.get_json("/api/orders/1042").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication required");
}
