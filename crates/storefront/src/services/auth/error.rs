//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] ecomify_core::EmailError),

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already exists for this email.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// OAuth provider is not enabled for the storefront.
    #[error("unsupported OAuth provider: {0}")]
    UnsupportedProvider(String),

    /// OAuth verifier missing from the session or callback without a code.
    #[error("invalid session state")]
    InvalidSessionState,

    /// Access token rejected by the backend.
    #[error("session expired")]
    SessionExpired,

    /// Backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}
