//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness
//! GET    /health/ready                        - Readiness (pings the backend)
//!
//! # Catalog
//! GET    /api/products                        - List/filter/sort products
//! GET    /api/products/{id}                   - Product detail
//! GET    /api/products/{id}/recommendations   - Simulated AI recommendations
//! GET    /api/products/{id}/reviews           - Reviews
//! POST   /api/products/{id}/reviews           - Publish review (auth)
//! GET    /api/categories                      - Categories with counts
//! GET    /api/best-sellers                    - Best-selling products
//! GET    /api/search                          - Search
//! GET    /api/search/suggest                  - Autocomplete
//!
//! # Cart (session)
//! GET    /api/cart                            - Cart summary
//! POST   /api/cart/items                      - Add product
//! PATCH  /api/cart/items/{product_id}         - Set quantity
//! DELETE /api/cart/items/{product_id}         - Remove line
//! DELETE /api/cart                            - Empty cart
//! POST   /api/cart/coupon                     - Apply coupon
//! DELETE /api/cart/coupon                     - Remove coupon
//! GET    /api/coupons                         - Usable coupons
//!
//! # Wishlist (session for guests, backend for customers)
//! GET    /api/wishlist                        - Saved products
//! POST   /api/wishlist                        - Save product
//! DELETE /api/wishlist/{product_id}           - Remove product
//! POST   /api/wishlist/{product_id}/toggle    - Toggle product
//!
//! # Notifications
//! POST   /api/notifications/create            - Create for any user (service)
//! GET    /api/notifications                   - List (auth)
//! GET    /api/notifications/unread-count      - Unread badge (auth)
//! POST   /api/notifications/read-all          - Mark all read (auth)
//! POST   /api/notifications/{id}/read         - Mark read (auth)
//! DELETE /api/notifications/{id}              - Delete (auth)
//!
//! # Account (auth)
//! GET    /api/orders                          - Order history
//! GET    /api/orders/{id}                     - Order detail
//! GET    /api/price-alerts                    - Price alerts
//! POST   /api/price-alerts                    - Create alert
//! DELETE /api/price-alerts/{id}               - Delete alert
//!
//! # Auth (strict rate limit; `/api` has a relaxed one)
//! POST   /auth/sign-up
//! POST   /auth/sign-in
//! POST   /auth/sign-out
//! GET    /auth/oauth/{provider}               - 302 to the provider
//! GET    /auth/callback                       - OAuth return
//! POST   /auth/reset-password
//! POST   /auth/update-password                - (auth)
//! GET    /auth/me                             - (auth)
//! ```

pub mod auth;
pub mod cart;
pub mod coupons;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod price_alerts;
pub mod products;
pub mod search;
pub mod wishlist;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Method, Request, header::CONTENT_TYPE},
    middleware::from_fn,
    routing::{get, patch, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, create_session_layer, request_id_middleware,
    security_headers_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/oauth/{provider}", get(auth::oauth_start))
        .route("/callback", get(auth::oauth_callback))
        .route("/reset-password", post(auth::reset_password))
        .route("/update-password", post(auth::update_password))
        .layer(auth_rate_limiter())
        // Not rate limited: polled by the frontend on every page.
        .route("/me", get(auth::me))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route(
            "/products/{id}/recommendations",
            get(products::recommendations),
        )
        .route(
            "/products/{id}/reviews",
            get(products::reviews).post(products::create_review),
        )
        .route("/categories", get(products::categories))
        .route("/best-sellers", get(products::best_sellers))
        .route("/search", get(search::search))
        .route("/search/suggest", get(search::suggest))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{product_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route(
            "/coupon",
            post(cart::apply_coupon).delete(cart::remove_coupon),
        )
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::index).post(wishlist::add))
        .route("/{product_id}", axum::routing::delete(wishlist::remove))
        .route("/{product_id}/toggle", post(wishlist::toggle))
}

/// Create the notification routes router.
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(notifications::index))
        .route("/create", post(notifications::create))
        .route("/unread-count", get(notifications::unread_count))
        .route("/read-all", post(notifications::mark_all_read))
        .route("/{id}/read", post(notifications::mark_read))
        .route("/{id}", axum::routing::delete(notifications::delete))
}

/// Create the account routes router (orders and price alerts).
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route(
            "/price-alerts",
            get(price_alerts::index).post(price_alerts::create),
        )
        .route(
            "/price-alerts/{id}",
            axum::routing::delete(price_alerts::delete),
        )
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(account_routes())
        .nest("/cart", cart_routes())
        .route("/coupons", get(coupons::index))
        .nest("/wishlist", wishlist_routes())
        .nest("/notifications", notification_routes())
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
        .nest("/auth", auth_routes())
}

/// Build the application with its middleware stack.
///
/// Sentry layers are added by the binary. Rate limiters key on the client
/// IP, so requests need a proxy header or `ConnectInfo`.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    let cors = cors_layer(&state.config().base_url);

    routes()
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(cors)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// CORS for the storefront frontend at `base_url`, with cookies.
fn cors_layer(base_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(base_url) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!(error = %e, base_url, "Base URL is not a valid origin, CORS disabled");
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}
