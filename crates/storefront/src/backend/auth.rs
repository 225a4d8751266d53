//! Auth API of the hosted backend.
//!
//! Thin typed calls only; validation and result shaping live in
//! [`crate::services::auth`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ecomify_core::UserId;

use super::{BackendClient, BackendError, Caller, check_status, decode};

/// User record as returned by the auth API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendUser {
    pub id: UserId,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Token grant returned by sign-in, sign-up (auto-confirm) and code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub user: BackendUser,
}

/// Sign-up answers with a session when the project auto-confirms emails and
/// with the bare user otherwise.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    User(BackendUser),
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: serde_json::Value,
}

#[derive(Serialize)]
struct RecoverBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct PkceExchange<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct PasswordUpdate<'a> {
    password: &'a str,
}

impl BackendClient {
    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects the sign-up.
    #[instrument(skip(self, email, password, metadata))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<SignUpResponse, BackendError> {
        let body = SignUpBody {
            email,
            password,
            data: metadata,
        };
        let response = self
            .request(
                reqwest::Method::POST,
                &self.auth_endpoint("signup"),
                Caller::Anonymous,
            )
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }

    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 400 on bad credentials.
    #[instrument(skip(self, email, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, BackendError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &self.auth_endpoint("token?grant_type=password"),
                Caller::Anonymous,
            )
            .json(&PasswordCredentials { email, password })
            .send()
            .await?;
        decode(response).await
    }

    /// Trade a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 400 if the refresh token was
    /// revoked or already used.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<TokenResponse, BackendError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &self.auth_endpoint("token?grant_type=refresh_token"),
                Caller::Anonymous,
            )
            .json(&RefreshGrant { refresh_token })
            .send()
            .await?;
        decode(response).await
    }

    /// Revoke the session behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, access_token))]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &self.auth_endpoint("logout"),
                Caller::User(access_token),
            )
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    /// Send a password recovery email.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, email))]
    pub async fn recover(&self, email: &str, redirect_to: &str) -> Result<(), BackendError> {
        let url = self.auth_endpoint(&format!(
            "recover?redirect_to={}",
            urlencoding::encode(redirect_to)
        ));
        let response = self
            .request(reqwest::Method::POST, &url, Caller::Anonymous)
            .json(&RecoverBody { email })
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    /// Set a new password for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is invalid.
    #[instrument(skip(self, access_token, password))]
    pub async fn update_password(
        &self,
        access_token: &str,
        password: &str,
    ) -> Result<BackendUser, BackendError> {
        let response = self
            .request(
                reqwest::Method::PUT,
                &self.auth_endpoint("user"),
                Caller::User(access_token),
            )
            .json(&PasswordUpdate { password })
            .send()
            .await?;
        decode(response).await
    }

    /// Fetch the user behind `access_token`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is invalid.
    #[instrument(skip(self, access_token))]
    pub async fn get_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &self.auth_endpoint("user"),
                Caller::User(access_token),
            )
            .send()
            .await?;
        decode(response).await
    }

    /// URL of the provider consent screen (PKCE flow, S256 challenge).
    #[must_use]
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, code_challenge: &str) -> String {
        self.auth_endpoint(&format!(
            "authorize?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=s256",
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to),
            urlencoding::encode(code_challenge),
        ))
    }

    /// Exchange an OAuth authorization code for a session.
    ///
    /// # Errors
    ///
    /// Returns error if the code or verifier is rejected.
    #[instrument(skip(self, auth_code, code_verifier))]
    pub async fn exchange_code(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, BackendError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &self.auth_endpoint("token?grant_type=pkce"),
                Caller::Anonymous,
            )
            .json(&PkceExchange {
                auth_code,
                code_verifier,
            })
            .send()
            .await?;
        decode(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const USER_JSON: &str = r#"{
        "id": "2f1b6c1e-8c0a-4f57-9a51-3d8a3c6f0b11",
        "email": "ana@ecomify.com.br",
        "user_metadata": {"full_name": "Ana Souza"},
        "email_confirmed_at": null,
        "created_at": "2024-05-01T12:00:00Z"
    }"#;

    #[test]
    fn test_sign_up_response_user_only() {
        let parsed: SignUpResponse = serde_json::from_str(USER_JSON).unwrap();
        assert!(matches!(parsed, SignUpResponse::User(_)));
    }

    #[test]
    fn test_sign_up_response_with_session() {
        let json = format!(
            r#"{{"access_token":"at","refresh_token":"rt","expires_in":3600,"token_type":"bearer","user":{USER_JSON}}}"#
        );
        let parsed: SignUpResponse = serde_json::from_str(&json).unwrap();
        let SignUpResponse::Session(session) = parsed else {
            panic!("expected a session");
        };
        assert_eq!(session.access_token, "at");
        assert_eq!(session.user.email.as_deref(), Some("ana@ecomify.com.br"));
    }
}
