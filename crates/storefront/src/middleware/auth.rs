//! Authentication extractors.
//!
//! The signed-in customer lives in the session as a [`CurrentCustomer`].
//! Both extractors renew an expired access token with the refresh token
//! before handing the customer to the handler; a refresh token the backend
//! no longer accepts signs the customer out.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentCustomer, session_keys};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a signed-in customer.
///
/// Rejects with `401 {"error": "Authentication required"}` otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_orders(
///     State(state): State<AppState>,
///     RequireAuth(customer): RequireAuth,
/// ) -> Result<Json<Vec<OrderView>>> {
///     // ...
/// }
/// ```
pub struct RequireAuth(pub CurrentCustomer);

/// Rejection for [`RequireAuth`].
#[derive(Debug)]
pub enum AuthRejection {
    /// No session layer on the route.
    MissingSession,
    /// Not signed in, or the session could not be renewed.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingSession => {
                tracing::error!("Session layer missing from auth-protected route");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::MissingSession)?;

        current_customer(&session, state)
            .await
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that optionally gets the signed-in customer.
///
/// Never rejects; guests get `None`.
pub struct OptionalAuth(pub Option<CurrentCustomer>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let customer = match parts.extensions.get::<Session>().cloned() {
            Some(session) => current_customer(&session, state).await,
            None => None,
        };

        Ok(Self(customer))
    }
}

/// Read the customer from the session, renewing an expired token.
async fn current_customer(session: &Session, state: &AppState) -> Option<CurrentCustomer> {
    let customer: CurrentCustomer = session
        .get(session_keys::CURRENT_CUSTOMER)
        .await
        .ok()
        .flatten()?;

    if !customer.is_expired() {
        return Some(customer);
    }

    let auth = AuthService::new(state.backend(), &state.config().base_url);
    match auth.refresh(&customer).await {
        Ok(renewed) => {
            if let Err(e) = set_current_customer(session, &renewed).await {
                tracing::warn!(error = %e, "Failed to store refreshed session");
            }
            Some(renewed)
        }
        Err(AuthError::SessionExpired) => {
            tracing::info!(user_id = %customer.id, "Refresh token rejected, signing out");
            if let Err(e) = clear_current_customer(session).await {
                tracing::warn!(error = %e, "Failed to clear expired session");
            }
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "Session refresh failed");
            None
        }
    }
}

/// Store the signed-in customer in the session.
///
/// Cycles the session ID to prevent fixation and tags the Sentry scope.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await?;
    set_sentry_user(&customer.id, Some(customer.email.as_str()));
    Ok(())
}

/// Remove the signed-in customer from the session (sign-out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    clear_sentry_user();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use chrono::{Duration, Utc};
    use ecomify_core::{Email, UserId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn customer() -> CurrentCustomer {
        CurrentCustomer {
            id: UserId::generate(),
            email: Email::parse("bruno@ecomify.com.br").unwrap(),
            full_name: Some("Bruno Lima".to_string()),
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn test_set_and_clear_current_customer() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let customer = customer();

        set_current_customer(&session, &customer).await.unwrap();
        let stored: CurrentCustomer = session
            .get(session_keys::CURRENT_CUSTOMER)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, customer.id);

        clear_current_customer(&session).await.unwrap();
        assert!(
            session
                .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_unauthorized_rejection_body() {
        let response = AuthRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Authentication required");
    }
}
