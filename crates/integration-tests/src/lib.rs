//! End-to-end test harness for the Ecomify storefront.
//!
//! Every test spawns its own storefront on an ephemeral port, wired to an
//! in-process stand-in for the hosted backend. Requests go over real TCP so
//! the rate limiters see a peer address and the session cookie round-trips
//! through a cookie-store client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ecomify-integration-tests
//! ```

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

use ecomify_storefront::config::{BackendConfig, CatalogConfig, SentryConfig, StorefrontConfig};
use ecomify_storefront::routes;
use ecomify_storefront::state::AppState;

/// Password the fake backend accepts for any email.
pub const TEST_PASSWORD: &str = "senha123";

/// User the fake backend signs everyone in as.
pub const TEST_USER_ID: &str = "2f1b6c1e-8c0a-4f57-9a51-3d8a3c6f0b11";

/// Display name carried in the fake user's metadata.
pub const TEST_USER_NAME: &str = "Ana Souza";

// =============================================================================
// Fake Backend
// =============================================================================

#[derive(Default)]
struct BackendState {
    notifications: Mutex<Vec<Value>>,
    wishlist: Mutex<Vec<Value>>,
    orders: Mutex<Vec<Value>>,
    fail_writes: AtomicBool,
}

impl BackendState {
    fn rows(table: &Mutex<Vec<Value>>) -> Vec<Value> {
        table.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn push(table: &Mutex<Vec<Value>>, rows: impl IntoIterator<Item = Value>) {
        table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(rows);
    }
}

/// In-process stand-in for the hosted backend's REST and auth APIs.
///
/// Covers only the endpoints the storefront calls in tests. Reads honour
/// `eq.` filters; ordering and limits are ignored.
#[derive(Clone)]
pub struct FakeBackend {
    url: Url,
    state: Arc<BackendState>,
}

impl FakeBackend {
    /// Start the fake backend on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());

        let app = Router::new()
            .route("/auth/v1/health", get(auth_health))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/signup", post(sign_up))
            .route("/auth/v1/logout", post(logout))
            .route("/auth/v1/user", get(current_user))
            .route(
                "/rest/v1/notifications",
                get(list_notifications).post(insert_notifications),
            )
            .route(
                "/rest/v1/wishlist",
                get(list_wishlist).post(upsert_wishlist),
            )
            .route("/rest/v1/orders", get(list_orders))
            .with_state(Arc::clone(&state));

        let (listener, addr) = bind().await;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        let url = Url::parse(&format!("http://{addr}")).expect("fake backend URL");

        Self { url, state }
    }

    /// Base URL of the fake backend.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Make every REST write answer 500 until reset.
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Notification rows inserted so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Value> {
        BackendState::rows(&self.state.notifications)
    }

    /// Store an order row as checkout would.
    pub fn add_order(&self, row: Value) {
        BackendState::push(&self.state.orders, [row]);
    }

    /// Wishlist rows upserted so far.
    #[must_use]
    pub fn wishlist(&self) -> Vec<Value> {
        BackendState::rows(&self.state.wishlist)
    }
}

fn user_json(email: &str) -> Value {
    json!({
        "id": TEST_USER_ID,
        "email": email,
        "user_metadata": { "full_name": TEST_USER_NAME },
        "email_confirmed_at": "2024-05-01T12:00:00Z",
        "created_at": "2024-05-01T12:00:00Z",
    })
}

fn token_json(email: &str) -> Value {
    json!({
        "access_token": format!("access-{}", uuid::Uuid::new_v4()),
        "refresh_token": format!("refresh-{}", uuid::Uuid::new_v4()),
        "expires_in": 3600,
        "token_type": "bearer",
        "user": user_json(email),
    })
}

fn api_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": "request_failed", "error_description": message })),
    )
        .into_response()
}

async fn auth_health() -> Json<Value> {
    Json(json!({ "name": "GoTrue", "version": "test" }))
}

#[derive(Deserialize)]
struct Grant {
    grant_type: String,
}

async fn token(Query(grant): Query<Grant>, Json(body): Json<Value>) -> Response {
    match grant.grant_type.as_str() {
        "password" => {
            let email = body["email"].as_str().unwrap_or_default();
            if body["password"].as_str() == Some(TEST_PASSWORD) {
                Json(token_json(email)).into_response()
            } else {
                api_error(StatusCode::BAD_REQUEST, "Invalid login credentials")
            }
        }
        "refresh_token" => Json(token_json("ana@ecomify.com.br")).into_response(),
        _ => api_error(StatusCode::BAD_REQUEST, "unsupported grant type"),
    }
}

async fn sign_up(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if email == "existente@ecomify.com.br" {
        return api_error(StatusCode::UNPROCESSABLE_ENTITY, "User already registered");
    }
    Json(token_json(email)).into_response()
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn current_user() -> Json<Value> {
    Json(user_json("ana@ecomify.com.br"))
}

/// Accept a single row or an array of rows.
fn rows_of(body: Value) -> Vec<Value> {
    match body {
        Value::Array(rows) => rows,
        row => vec![row],
    }
}

async fn insert_notifications(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> Response {
    if state.fail_writes.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "could not write notifications" })),
        )
            .into_response();
    }

    let stored: Vec<Value> = rows_of(body)
        .into_iter()
        .map(|mut row| {
            row["id"] = json!(uuid::Uuid::new_v4());
            row["created_at"] = json!(Utc::now());
            if row.get("read").is_none() {
                row["read"] = json!(false);
            }
            row
        })
        .collect();

    BackendState::push(&state.notifications, stored.clone());
    (StatusCode::CREATED, Json(stored)).into_response()
}

/// Keep rows matching every `column=eq.value` parameter.
fn filtered(rows: Vec<Value>, params: &HashMap<String, String>) -> Vec<Value> {
    let filters: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(column, value)| Some((column.as_str(), value.strip_prefix("eq.")?)))
        .collect();

    rows.into_iter()
        .filter(|row| {
            filters.iter().all(|(column, expected)| match &row[*column] {
                Value::String(text) => text == expected,
                other => other.to_string() == *expected,
            })
        })
        .collect()
}

async fn list_notifications(
    State(state): State<Arc<BackendState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    Json(filtered(BackendState::rows(&state.notifications), &params))
}

async fn upsert_wishlist(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> StatusCode {
    if state.fail_writes.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let mut rows = state.wishlist.lock().unwrap_or_else(PoisonError::into_inner);
    for mut row in rows_of(body) {
        let duplicate = rows
            .iter()
            .any(|r| r["user_id"] == row["user_id"] && r["product_id"] == row["product_id"]);
        if !duplicate {
            row["created_at"] = json!(Utc::now());
            rows.push(row);
        }
    }
    StatusCode::CREATED
}

async fn list_wishlist(
    State(state): State<Arc<BackendState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let mut rows = filtered(BackendState::rows(&state.wishlist), &params);
    rows.reverse();
    Json(rows)
}

async fn list_orders(
    State(state): State<Arc<BackendState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    Json(filtered(BackendState::rows(&state.orders), &params))
}

// =============================================================================
// Storefront Under Test
// =============================================================================

/// A running storefront plus a client that keeps its session cookie.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub backend: FakeBackend,
}

impl TestApp {
    /// Spawn a storefront backed by a fresh [`FakeBackend`].
    ///
    /// # Panics
    ///
    /// Panics if either server cannot start.
    pub async fn spawn() -> Self {
        let backend = FakeBackend::start().await;

        let config = StorefrontConfig {
            host: Ipv4Addr::LOCALHOST.into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            backend: BackendConfig {
                url: backend.url().clone(),
                anon_key: SecretString::from("test-anon-key"),
                service_key: Some(SecretString::from("test-service-key")),
            },
            catalog: CatalogConfig::default(),
            recommendation_delay: Duration::ZERO,
            sentry: SentryConfig::default(),
        };

        let state = AppState::new(config).expect("storefront state");
        let app = routes::app(state);
        let (listener, addr) = bind().await;
        tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Self {
            base_url: format!("http://{addr}"),
            client: client(),
            backend,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path` and return status plus JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the body is not JSON.
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed");
        into_json(response).await
    }

    /// POST `body` to `path` and return status plus JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed");
        into_json(response).await
    }

    /// Sign in as the fake backend's user.
    ///
    /// # Panics
    ///
    /// Panics if sign-in is rejected.
    pub async fn sign_in(&self) -> Value {
        let (status, body) = self
            .post_json(
                "/auth/sign-in",
                &json!({ "email": "ana@ecomify.com.br", "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "sign-in failed: {body}");
        body
    }
}

/// A client with a cookie store, so the session survives between requests.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create client")
}

async fn into_json(response: reqwest::Response) -> (StatusCode, Value) {
    let status = response.status();
    let text = response.text().await.expect("response body");
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener address");
    (listener, addr)
}
