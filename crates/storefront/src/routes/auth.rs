//! Authentication route handlers.
//!
//! JSON endpoints over [`AuthService`]. A successful sign-in of any kind
//! stores the customer in the session and merges the guest wishlist into
//! the customer's saved list.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, CustomerView, session_keys};
use crate::services::auth::{AuthError, AuthService, OAuthProvider, SignUpOutcome};
use crate::services::wishlist::Wishlist;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Body of `POST /auth/sign-up`.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Body of `POST /auth/sign-in`.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Body of `POST /auth/update-password`.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// Query string of the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Sign-up result.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignUpResponse {
    SignedIn { customer: CustomerView },
    ConfirmationRequired { email: String },
}

// =============================================================================
// Helpers
// =============================================================================

/// Store the customer and move the guest wishlist over.
///
/// A failed merge keeps the guest list in the session and does not fail the
/// sign-in.
async fn start_session(
    state: &AppState,
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<()> {
    set_current_customer(session, customer).await?;

    match Wishlist::new(session, state.backend(), Some(customer))
        .merge_guest_items()
        .await
    {
        Ok(0) => {}
        Ok(count) => tracing::debug!(count, "Guest wishlist merged on sign-in"),
        Err(e) => tracing::warn!(error = %e, "Failed to merge guest wishlist"),
    }

    add_breadcrumb("auth", "Signed in", None);
    Ok(())
}

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.backend(), &state.config().base_url)
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new customer.
#[instrument(skip(state, session, body))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SignUpRequest>,
) -> Result<Response> {
    let outcome = auth_service(&state)
        .sign_up(&body.email, &body.password, body.full_name.as_deref())
        .await?;

    match outcome {
        SignUpOutcome::SignedIn(customer) => {
            start_session(&state, &session, &customer).await?;
            tracing::info!(user_id = %customer.id, "Customer registered");
            Ok((
                StatusCode::CREATED,
                Json(SignUpResponse::SignedIn {
                    customer: CustomerView::from(&customer),
                }),
            )
                .into_response())
        }
        SignUpOutcome::ConfirmationRequired { email } => Ok((
            StatusCode::ACCEPTED,
            Json(SignUpResponse::ConfirmationRequired {
                email: email.as_str().to_string(),
            }),
        )
            .into_response()),
    }
}

/// Sign in with email and password.
#[instrument(skip(state, session, body))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SignInRequest>,
) -> Result<Json<CustomerView>> {
    let customer = auth_service(&state)
        .sign_in(&body.email, &body.password)
        .await?;
    start_session(&state, &session, &customer).await?;

    tracing::info!(user_id = %customer.id, "Customer signed in");
    Ok(Json(CustomerView::from(&customer)))
}

/// Sign out; the backend session is revoked on a best-effort basis.
#[instrument(skip(state, session, customer))]
pub async fn sign_out(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    session: Session,
) -> Result<StatusCode> {
    if let Some(customer) = customer
        && let Err(e) = auth_service(&state).sign_out(&customer).await
    {
        tracing::warn!(error = %e, "Backend sign-out failed");
    }

    clear_current_customer(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Redirect to the provider's consent screen.
#[instrument(skip(state, session))]
pub async fn oauth_start(
    State(state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
) -> Result<Response> {
    let provider: OAuthProvider = provider.parse()?;
    let redirect = auth_service(&state).oauth_redirect(provider);

    session
        .insert(session_keys::OAUTH_VERIFIER, &redirect.code_verifier)
        .await?;

    Ok((StatusCode::FOUND, [(LOCATION, redirect.url)]).into_response())
}

/// Finish social login and send the browser back to the storefront.
#[instrument(skip(state, session, query))]
pub async fn oauth_callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if let Some(error) = query.error {
        tracing::warn!(
            error = %error,
            description = ?query.error_description,
            "OAuth provider returned an error"
        );
        return Err(AppError::BadRequest(
            query
                .error_description
                .unwrap_or_else(|| "Login was cancelled".to_string()),
        ));
    }

    let code = query.code.ok_or(AuthError::InvalidSessionState)?;
    let verifier: String = session
        .remove(session_keys::OAUTH_VERIFIER)
        .await?
        .ok_or(AuthError::InvalidSessionState)?;

    let customer = auth_service(&state)
        .complete_oauth(&code, &verifier)
        .await?;
    start_session(&state, &session, &customer).await?;

    tracing::info!(user_id = %customer.id, "Customer signed in with OAuth");
    Ok((
        StatusCode::FOUND,
        [(LOCATION, format!("{}/", state.config().base_url))],
    )
        .into_response())
}

/// Email a password reset link. Always reports success.
#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    auth_service(&state)
        .request_password_reset(&body.email)
        .await?;
    Ok(Json(json!({
        "message": "Se houver uma conta com este e-mail, enviaremos um link para redefinir a senha."
    })))
}

/// Set a new password for the signed-in customer.
#[instrument(skip(state, customer, body), fields(user_id = %customer.id))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<StatusCode> {
    auth_service(&state)
        .update_password(&customer.access_token, &body.password)
        .await?;
    tracing::info!("Password updated");
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in customer, as the backend currently knows them.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<CustomerView>> {
    let user = auth_service(&state)
        .current_user(&customer.access_token)
        .await?;

    let mut view = CustomerView::from(&customer);
    if let Some(name) = user
        .user_metadata
        .get("full_name")
        .and_then(serde_json::Value::as_str)
    {
        view.full_name = Some(name.to_string());
    }
    Ok(Json(view))
}
