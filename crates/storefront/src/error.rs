//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`. Responses carry a JSON body `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::coupons::CouponError;
use crate::services::notifications::NotificationError;
use crate::services::orders::OrderError;
use crate::services::price_alerts::PriceAlertError;
use crate::services::reviews::ReviewError;
use crate::services::wishlist::WishlistError;

const INTERNAL_MESSAGE: &str = "Internal server error";
const BACKEND_MESSAGE: &str = "External service error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Coupon could not be applied.
    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    /// Notification operation failed.
    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    /// Order lookup failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Price alert operation failed.
    #[error("Price alert error: {0}")]
    PriceAlert(#[from] PriceAlertError),

    /// Review operation failed.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Wishlist operation failed.
    #[error("Wishlist error: {0}")]
    Wishlist(#[from] WishlistError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and client-facing message.
    ///
    /// Server-side failures never expose their details.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Backend(e) => backend_failure(e),
            Self::Auth(err) => auth_response(err),
            Self::Cart(err) => {
                let status = match err {
                    CartError::InvalidQuantity => StatusCode::BAD_REQUEST,
                    CartError::OutOfStock | CartError::InsufficientStock { .. } => {
                        StatusCode::CONFLICT
                    }
                    CartError::NotInCart(_) => StatusCode::NOT_FOUND,
                };
                (status, err.to_string())
            }
            Self::Coupon(err) => {
                let status = match err {
                    CouponError::NotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            Self::Notification(err) => match err {
                NotificationError::MissingFields | NotificationError::InvalidType(_) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                NotificationError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                NotificationError::Backend(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create notification".to_string(),
                ),
            },
            Self::Order(err) => match err {
                OrderError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                OrderError::Backend(e) => backend_failure(e),
            },
            Self::PriceAlert(err) => match err {
                PriceAlertError::Backend(e) => backend_failure(e),
                _ => (StatusCode::BAD_REQUEST, err.to_string()),
            },
            Self::Review(err) => match err {
                ReviewError::Backend(e) => backend_failure(e),
                _ => (StatusCode::BAD_REQUEST, err.to_string()),
            },
            Self::Wishlist(err) => match err {
                WishlistError::Backend(e) => backend_failure(e),
                WishlistError::Session(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            Self::Session(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests".to_string(),
            ),
        }
    }
}

fn backend_failure(e: &BackendError) -> (StatusCode, String) {
    match e {
        BackendError::RateLimited(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            BACKEND_MESSAGE.to_string(),
        ),
        _ => (StatusCode::BAD_GATEWAY, BACKEND_MESSAGE.to_string()),
    }
}

fn auth_response(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        }
        AuthError::UserAlreadyExists => (
            StatusCode::CONFLICT,
            "An account with this email already exists".to_string(),
        ),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidEmail(_) => {
            (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
        }
        AuthError::UnsupportedProvider(provider) => (
            StatusCode::NOT_FOUND,
            format!("Unsupported login provider: {provider}"),
        ),
        AuthError::InvalidSessionState => (
            StatusCode::UNAUTHORIZED,
            "Session expired, please try again".to_string(),
        ),
        AuthError::SessionExpired => (
            StatusCode::UNAUTHORIZED,
            "Session expired, please sign in again".to_string(),
        ),
        AuthError::Backend(e) => backend_failure(e),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for customer actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Coupon applied", Some(&[("code", "BEMVINDO10")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
