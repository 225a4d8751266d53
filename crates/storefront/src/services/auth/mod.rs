//! Authentication service.
//!
//! Sequential wrappers over the backend auth API: validate input, call the
//! backend once, shape the result. No retries and no state machine; the
//! resulting session lives in the HTTP session as a [`CurrentCustomer`].

mod error;

pub use error::AuthError;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use ecomify_core::Email;

use crate::backend::auth::{BackendUser, SignUpResponse, TokenResponse};
use crate::backend::{BackendClient, BackendError};
use crate::models::CurrentCustomer;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length accepted by the backend.
const MAX_PASSWORD_LENGTH: usize = 72;

/// Length of the PKCE code verifier (RFC 7636 allows 43..=128).
const PKCE_VERIFIER_LENGTH: usize = 64;

/// Social login providers enabled for the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Github,
    Facebook,
}

impl OAuthProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
            Self::Facebook => "facebook",
        }
    }
}

impl std::str::FromStr for OAuthProvider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            "facebook" => Ok(Self::Facebook),
            other => Err(AuthError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Result of a sign-up.
#[derive(Debug, Clone)]
pub enum SignUpOutcome {
    /// The backend auto-confirmed the account and issued a session.
    SignedIn(CurrentCustomer),
    /// A confirmation email was sent; no session yet.
    ConfirmationRequired { email: Email },
}

/// Redirect target plus the PKCE verifier to keep until the callback.
#[derive(Debug, Clone)]
pub struct OAuthRedirect {
    pub url: String,
    pub code_verifier: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
    base_url: &'a str,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(backend: &'a BackendClient, base_url: &'a str) -> Self {
        Self { backend, base_url }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all, fields(email_domain))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = Email::parse(email)?;
        tracing::Span::current().record("email_domain", email.domain());
        validate_password(password)?;

        let metadata = full_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(
                || serde_json::json!({}),
                |name| serde_json::json!({ "full_name": name }),
            );

        let response = self
            .backend
            .sign_up(email.as_str(), password, metadata)
            .await
            .map_err(map_sign_up_error)?;

        match response {
            SignUpResponse::Session(tokens) => {
                tracing::info!("Sign-up completed with immediate session");
                Ok(SignUpOutcome::SignedIn(customer_from_tokens(tokens)?))
            }
            SignUpResponse::User(_) => {
                tracing::info!("Sign-up awaiting email confirmation");
                Ok(SignUpOutcome::ConfirmationRequired { email })
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all, fields(email_domain))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<CurrentCustomer, AuthError> {
        let email = Email::parse(email)?;
        tracing::Span::current().record("email_domain", email.domain());
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self
            .backend
            .sign_in_with_password(email.as_str(), password)
            .await
            .map_err(|e| match e.status() {
                Some(400 | 401 | 422) => AuthError::InvalidCredentials,
                _ => AuthError::Backend(e),
            })?;

        customer_from_tokens(tokens)
    }

    /// Renew an expired session with its refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the refresh token is no longer
    /// accepted.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn refresh(&self, customer: &CurrentCustomer) -> Result<CurrentCustomer, AuthError> {
        let tokens = self
            .backend
            .refresh_session(&customer.refresh_token)
            .await
            .map_err(|e| match e.status() {
                Some(400 | 401 | 403) => AuthError::SessionExpired,
                _ => AuthError::Backend(e),
            })?;

        tracing::debug!("Session refreshed");
        customer_from_tokens(tokens)
    }

    /// Revoke the backend session.
    ///
    /// An already-expired token counts as signed out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` for transport or server failures.
    #[instrument(skip(self, customer))]
    pub async fn sign_out(&self, customer: &CurrentCustomer) -> Result<(), AuthError> {
        match self.backend.sign_out(&customer.access_token).await {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.status(), Some(401 | 403 | 404)) => Ok(()),
            Err(e) => Err(AuthError::Backend(e)),
        }
    }

    /// Build the provider redirect for social login.
    #[must_use]
    pub fn oauth_redirect(&self, provider: OAuthProvider) -> OAuthRedirect {
        let code_verifier = generate_code_verifier();
        let challenge = code_challenge(&code_verifier);
        let redirect_to = format!("{}/auth/callback", self.base_url);

        OAuthRedirect {
            url: self
                .backend
                .authorize_url(provider.as_str(), &redirect_to, &challenge),
            code_verifier,
        }
    }

    /// Finish social login with the code from the callback.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidSessionState` if the backend rejects the code.
    #[instrument(skip(self, auth_code, code_verifier))]
    pub async fn complete_oauth(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<CurrentCustomer, AuthError> {
        let tokens = self
            .backend
            .exchange_code(auth_code, code_verifier)
            .await
            .map_err(|e| match e.status() {
                Some(400 | 401 | 403 | 404) => AuthError::InvalidSessionState,
                _ => AuthError::Backend(e),
            })?;

        customer_from_tokens(tokens)
    }

    /// Ask the backend to email a password reset link.
    ///
    /// Unknown addresses are not reported back, so callers cannot discover
    /// which emails have accounts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for malformed input and
    /// `AuthError::Backend` for transport/server failures.
    #[instrument(skip_all, fields(email_domain))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        tracing::Span::current().record("email_domain", email.domain());
        let redirect_to = format!("{}/auth/reset-password", self.base_url);

        match self.backend.recover(email.as_str(), &redirect_to).await {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.status(), Some(404 | 422)) => {
                tracing::debug!("Password reset requested for unknown address");
                Ok(())
            }
            Err(e) => Err(AuthError::Backend(e)),
        }
    }

    /// Set a new password for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` or `AuthError::SessionExpired`.
    #[instrument(skip(self, access_token, new_password))]
    pub async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        self.backend
            .update_password(access_token, new_password)
            .await
            .map(|_| ())
            .map_err(map_token_error)
    }

    /// Re-read the customer profile behind an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionExpired` if the token was rejected.
    pub async fn current_user(&self, access_token: &str) -> Result<BackendUser, AuthError> {
        self.backend
            .get_user(access_token)
            .await
            .map_err(map_token_error)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn map_sign_up_error(e: BackendError) -> AuthError {
    if let BackendError::Api { status, message } = &e {
        let lower = message.to_lowercase();
        if lower.contains("already registered") || lower.contains("already exists") {
            return AuthError::UserAlreadyExists;
        }
        if *status == 422 && lower.contains("password") {
            return AuthError::WeakPassword(message.clone());
        }
    }
    AuthError::Backend(e)
}

fn map_token_error(e: BackendError) -> AuthError {
    match e.status() {
        Some(401 | 403) => AuthError::SessionExpired,
        _ => AuthError::Backend(e),
    }
}

/// Shape a token grant into the session-stored customer.
fn customer_from_tokens(tokens: TokenResponse) -> Result<CurrentCustomer, AuthError> {
    let email = tokens
        .user
        .email
        .as_deref()
        .ok_or_else(|| BackendError::Parse("user without email".to_string()))?;
    let email = Email::parse(email)?;

    let full_name = tokens
        .user
        .user_metadata
        .get("full_name")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    Ok(CurrentCustomer {
        id: tokens.user.id,
        email,
        full_name,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
    })
}

/// Validate password strength: length bounds, at least one letter and one digit.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    if !password.chars().any(char::is_alphabetic) || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(AuthError::WeakPassword(
            "password must contain letters and numbers".to_string(),
        ));
    }
    Ok(())
}

/// Random PKCE verifier from the RFC 7636 unreserved alphabet.
fn generate_code_verifier() -> String {
    const CHARSET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
    let mut rng = rand::rng();
    (0..PKCE_VERIFIER_LENGTH)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

/// S256 challenge: base64url(SHA-256(verifier)) without padding.
fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
