//! Session cart, shipping and coupons across requests.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use ecomify_integration_tests::TestApp;

const JBL_TUNE: i32 = 7;
const ANKER_CHARGER: i32 = 15;
const AIRPODS: i32 = 8;
const LENOVO_LOQ: i32 = 6;

fn money(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().unwrap()).unwrap()
}

fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

async fn add(app: &TestApp, product_id: i32, quantity: u32) -> (StatusCode, Value) {
    app.post_json(
        "/api/cart/items",
        &json!({ "product_id": product_id, "quantity": quantity }),
    )
    .await
}

async fn set_quantity(app: &TestApp, product_id: i32, quantity: u32) -> (StatusCode, Value) {
    let response = app
        .client
        .patch(app.url(&format!("/api/cart/items/{product_id}")))
        .json(&json!({ "quantity": quantity }))
        .send()
        .await
        .unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_empty_cart() {
    let app = TestApp::spawn().await;

    let (status, cart) = app.get_json("/api/cart").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["item_count"], 0);
    assert_eq!(money(&cart["total"]), Decimal::ZERO);
    assert_eq!(money(&cart["shipping"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_cart_persists_across_requests() {
    let app = TestApp::spawn().await;

    add(&app, JBL_TUNE, 1).await;
    add(&app, JBL_TUNE, 1).await;
    let (status, cart) = app.get_json("/api/cart").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["item_count"], 2);
    assert_eq!(money(&cart["items"][0]["line_total"]), dec("499.80"));
    assert_eq!(money(&cart["subtotal"]), dec("499.80"));
}

#[tokio::test]
async fn test_separate_clients_have_separate_carts() {
    let app = TestApp::spawn().await;
    add(&app, JBL_TUNE, 1).await;

    let other = ecomify_integration_tests::client();
    let cart: Value = other
        .get(app.url("/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
async fn test_shipping_charged_below_threshold() {
    let app = TestApp::spawn().await;

    let (status, cart) = add(&app, ANKER_CHARGER, 1).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&cart["subtotal"]), dec("279.00"));
    assert_eq!(money(&cart["shipping"]), dec("19.90"));
    assert_eq!(money(&cart["total"]), dec("298.90"));
}

#[tokio::test]
async fn test_shipping_free_from_threshold() {
    let app = TestApp::spawn().await;

    let (_, cart) = add(&app, JBL_TUNE, 2).await;

    assert_eq!(money(&cart["shipping"]), Decimal::ZERO);
    assert_eq!(money(&cart["total"]), dec("499.80"));
}

#[tokio::test]
async fn test_update_and_remove_lines() {
    let app = TestApp::spawn().await;
    add(&app, JBL_TUNE, 1).await;
    add(&app, ANKER_CHARGER, 1).await;

    let (status, cart) = set_quantity(&app, JBL_TUNE, 3).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["item_count"], 4);

    let (status, cart) = set_quantity(&app, JBL_TUNE, 0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["product_id"], ANKER_CHARGER);

    let response = app
        .client
        .delete(app.url(&format!("/api/cart/items/{ANKER_CHARGER}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cart: Value = response.json().await.unwrap();
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
async fn test_updating_missing_line_is_404() {
    let app = TestApp::spawn().await;

    let (status, _) = set_quantity(&app, JBL_TUNE, 2).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stock_limits() {
    let app = TestApp::spawn().await;

    let (status, body) = add(&app, LENOVO_LOQ, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Product is out of stock");

    let (status, body) = add(&app, AIRPODS, 31).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Only 30 units available");

    let (status, _) = add(&app, 9999, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_percentage_coupon() {
    let app = TestApp::spawn().await;
    add(&app, JBL_TUNE, 2).await;

    let (status, cart) = app
        .post_json("/api/cart/coupon", &json!({ "code": "bemvindo10" }))
        .await;

    assert_eq!(status, StatusCode::OK, "unexpected body: {cart}");
    assert_eq!(cart["coupon"]["code"], "BEMVINDO10");
    assert_eq!(money(&cart["discount"]), dec("49.98"));
    assert_eq!(money(&cart["total"]), dec("449.82"));
}

#[tokio::test]
async fn test_free_shipping_coupon() {
    let app = TestApp::spawn().await;
    add(&app, ANKER_CHARGER, 1).await;

    let (status, cart) = app
        .post_json("/api/cart/coupon", &json!({ "code": "FRETEGRATIS" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&cart["shipping"]), Decimal::ZERO);
    assert_eq!(money(&cart["total"]), dec("279.00"));
}

#[tokio::test]
async fn test_coupon_rejections() {
    let app = TestApp::spawn().await;
    add(&app, ANKER_CHARGER, 1).await;

    let (status, body) = app
        .post_json("/api/cart/coupon", &json!({ "code": "DESCONTO50" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("300"));

    let (status, _) = app
        .post_json("/api/cart/coupon", &json!({ "code": "NAOEXISTE" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post_json("/api/cart/coupon", &json!({ "code": "VERAO15" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, cart) = app.get_json("/api/cart").await;
    assert_eq!(cart["coupon"], Value::Null);
}

#[tokio::test]
async fn test_coupon_dropped_when_subtotal_falls_below_minimum() {
    let app = TestApp::spawn().await;
    add(&app, JBL_TUNE, 2).await;
    let (status, _) = app
        .post_json("/api/cart/coupon", &json!({ "code": "DESCONTO50" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, cart) = set_quantity(&app, JBL_TUNE, 1).await;
    assert_eq!(cart["coupon"], Value::Null);
    assert!(cart["coupon_notice"].is_string());
    assert_eq!(money(&cart["discount"]), Decimal::ZERO);

    let (_, cart) = app.get_json("/api/cart").await;
    assert_eq!(cart["coupon"], Value::Null);
    assert!(cart.get("coupon_notice").is_none());
}

#[tokio::test]
async fn test_available_coupons_skip_unusable() {
    let app = TestApp::spawn().await;

    let (status, coupons) = app.get_json("/api/coupons").await;

    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = coupons
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert!(codes.contains(&"BEMVINDO10"));
    assert!(!codes.contains(&"VERAO15"));
    assert!(!codes.contains(&"PRIMEIROS100"));
    assert!(!codes.contains(&"BLACKFRIDAY"));
}
