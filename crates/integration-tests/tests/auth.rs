//! Sign-in, sign-up and the signed-in session.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use ecomify_integration_tests::{TEST_PASSWORD, TEST_USER_ID, TEST_USER_NAME, TestApp};

#[tokio::test]
async fn test_account_routes_require_sign_in() {
    let app = TestApp::spawn().await;

    for path in ["/auth/me", "/api/orders", "/api/price-alerts"] {
        let (status, body) = app.get_json(path).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(body["error"], "Authentication required");
    }
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post_json(
            "/auth/sign-in",
            &json!({ "email": "ana@ecomify.com.br", "password": "errada123" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = app.get_json("/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_email_is_rejected_before_backend() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post_json(
            "/auth/sign-in",
            &json!({ "email": "not-an-email", "password": TEST_PASSWORD }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email address");
}

#[tokio::test]
async fn test_sign_in_starts_session() {
    let app = TestApp::spawn().await;

    let customer = app.sign_in().await;
    assert_eq!(customer["id"], TEST_USER_ID);
    assert_eq!(customer["email"], "ana@ecomify.com.br");

    let (status, me) = app.get_json("/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["full_name"], TEST_USER_NAME);
}

#[tokio::test]
async fn test_sign_out_ends_session() {
    let app = TestApp::spawn().await;
    app.sign_in().await;

    let response = app
        .client
        .post(app.url("/auth/sign-out"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = app.get_json("/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_up_with_immediate_session() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .post_json(
            "/auth/sign-up",
            &json!({
                "email": "novo@ecomify.com.br",
                "password": "senha123",
                "full_name": "Cliente Novo",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    assert_eq!(body["status"], "signed_in");
    assert_eq!(body["customer"]["email"], "novo@ecomify.com.br");
}

#[tokio::test]
async fn test_sign_up_rejections() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .post_json(
            "/auth/sign-up",
            &json!({ "email": "novo@ecomify.com.br", "password": "curta" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/auth/sign-up",
            &json!({ "email": "existente@ecomify.com.br", "password": "senha123" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_guest_wishlist_merges_on_sign_in() {
    let app = TestApp::spawn().await;

    let (status, saved) = app
        .post_json("/api/wishlist", &json!({ "product_id": 7 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved.as_array().unwrap().len(), 1);
    assert!(app.backend.wishlist().is_empty());

    app.sign_in().await;

    let rows = app.backend.wishlist();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["product_id"], 7);
    assert_eq!(rows[0]["user_id"], TEST_USER_ID);

    let (status, saved) = app.get_json("/api/wishlist").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = saved.as_array().unwrap().iter().map(|p| &p["id"]).collect();
    assert_eq!(ids, vec![&json!(7)]);
}

#[tokio::test]
async fn test_oauth_start_redirects_to_provider() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/auth/oauth/google"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with(app.backend.url().as_str()));
    assert!(location.contains("provider=google"));
    assert!(location.contains("code_challenge_method=s256"));

    let (status, _) = app.get_json("/auth/oauth/myspace").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
