//! Hosted backend (BaaS) client.
//!
//! # Architecture
//!
//! The backend is an external managed service exposing two HTTP APIs:
//!
//! - Rows API at `<url>/rest/v1/<table>` (PostgREST conventions: filters as
//!   `column=eq.value`, `order=column.desc`, `limit=n`)
//! - Auth API at `<url>/auth/v1` (see [`auth`])
//!
//! The schema is owned by the backend. This module only issues typed
//! requests against it. Every request carries the `apikey` header plus a
//! bearer token chosen by [`Caller`], so row-level security applies to
//! customer-scoped calls. There are no retries.
//!
//! # Example
//!
//! ```rust,ignore
//! let client = BackendClient::new(&config.backend)?;
//!
//! let rows: Vec<Notification> = client
//!     .table("notifications", Caller::User(&token))
//!     .select(&Query::new().eq("user_id", user_id).order("created_at", Direction::Desc))
//!     .await?;
//! ```

pub mod auth;

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use secrecy::SecretString;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::instrument;

use crate::config::{BackendConfig, expose};

/// Request timeout for every backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when interacting with the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Expected row was not returned.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl BackendError {
    /// HTTP status reported by the backend, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }
}

/// Who a request is made on behalf of.
#[derive(Debug, Clone, Copy)]
pub enum Caller<'a> {
    /// Public access with the anonymous key.
    Anonymous,
    /// A signed-in customer; the value is their access token.
    User(&'a str),
    /// The storefront server itself, using the service key.
    Service,
}

/// Client for the hosted backend.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    rest_url: String,
    auth_url: String,
    anon_key: SecretString,
    server_key: SecretString,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let base = config.url.as_str().trim_end_matches('/');

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                http,
                rest_url: format!("{base}/rest/v1"),
                auth_url: format!("{base}/auth/v1"),
                anon_key: config.anon_key.clone(),
                server_key: config.server_key().clone(),
            }),
        })
    }

    /// Handle to a table of the rows API.
    #[must_use]
    pub const fn table<'a>(&'a self, name: &'a str, caller: Caller<'a>) -> Table<'a> {
        Table {
            client: self,
            name,
            caller,
        }
    }

    /// Check that the backend answers at all.
    ///
    /// # Errors
    ///
    /// Returns error if the auth health endpoint is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), BackendError> {
        let url = format!("{}/health", self.inner.auth_url);
        let response = self
            .request(reqwest::Method::GET, &url, Caller::Anonymous)
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    /// Build a request with the key/bearer pair appropriate for `caller`.
    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        caller: Caller<'_>,
    ) -> reqwest::RequestBuilder {
        let (apikey, bearer) = match caller {
            Caller::Anonymous => {
                let key = expose(&self.inner.anon_key);
                (key, key)
            }
            Caller::User(token) => (expose(&self.inner.anon_key), token),
            Caller::Service => {
                let key = expose(&self.inner.server_key);
                (key, key)
            }
        };

        self.inner
            .http
            .request(method, url)
            .header("apikey", apikey)
            .bearer_auth(bearer)
    }

    fn auth_endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.auth_url, path.trim_start_matches('/'))
    }
}

// =============================================================================
// Rows API
// =============================================================================

/// Sort direction for [`Query::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// PostgREST-style filter/order/limit builder.
///
/// Values are URL-encoded; column names are trusted literals from this crate.
#[derive(Debug, Clone, Default)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns, e.g. `"id"` or `"id,created_at"`.
    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    /// `column = value`
    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params
            .push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Order by a column.
    #[must_use]
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        let dir = match direction {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        };
        self.params.push(("order".to_string(), format!("{column}.{dir}")));
        self
    }

    /// Limit the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    /// Render as a URL query string (without the leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// A table of the rows API, bound to a caller.
pub struct Table<'a> {
    client: &'a BackendClient,
    name: &'a str,
    caller: Caller<'a>,
}

impl Table<'_> {
    fn url(&self, query: &Query) -> String {
        let base = format!("{}/{}", self.client.inner.rest_url, self.name);
        if query.is_empty() {
            base
        } else {
            format!("{base}?{}", query.to_query_string())
        }
    }

    /// Select rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or rows cannot be decoded.
    #[instrument(skip(self, query), fields(table = %self.name))]
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, BackendError> {
        let response = self
            .client
            .request(reqwest::Method::GET, &self.url(query), self.caller)
            .send()
            .await?;
        decode(response).await
    }

    /// Select exactly one row, mapping an empty result to `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no row matches.
    pub async fn select_one<T: DeserializeOwned>(&self, query: &Query) -> Result<T, BackendError> {
        let query = query.clone().limit(1);
        self.select::<T>(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(self.name.to_string()))
    }

    /// Insert a row and return the stored representation.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend returns no row.
    #[instrument(skip(self, row), fields(table = %self.name))]
    pub async fn insert<T, R>(&self, row: &T) -> Result<R, BackendError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .request(reqwest::Method::POST, &self.url(&Query::new()), self.caller)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        first_row(decode::<Vec<R>>(response).await?, self.name)
    }

    /// Insert or merge rows on the table's primary key.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, rows), fields(table = %self.name))]
    pub async fn upsert<T: Serialize>(&self, rows: &[T]) -> Result<(), BackendError> {
        let response = self
            .client
            .request(reqwest::Method::POST, &self.url(&Query::new()), self.caller)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }

    /// Update rows matching `query`, returning the updated rows.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or rows cannot be decoded.
    #[instrument(skip(self, query, patch), fields(table = %self.name))]
    pub async fn update<T, R>(&self, query: &Query, patch: &T) -> Result<Vec<R>, BackendError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .request(reqwest::Method::PATCH, &self.url(query), self.caller)
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;
        decode(response).await
    }

    /// Delete rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, query), fields(table = %self.name))]
    pub async fn delete(&self, query: &Query) -> Result<(), BackendError> {
        let response = self
            .client
            .request(reqwest::Method::DELETE, &self.url(query), self.caller)
            .send()
            .await?;
        check_status(response).await.map(|_| ())
    }
}

// =============================================================================
// Response helpers
// =============================================================================

/// Turn non-success statuses into `BackendError`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(BackendError::RateLimited(retry_after));
    }

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Backend returned non-success status"
    );
    Err(BackendError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Decode a JSON body after checking the status.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let response = check_status(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e.to_string())
    })
}

fn first_row<R>(rows: Vec<R>, table: &str) -> Result<R, BackendError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("{table}: no row returned")))
}

/// Pull a human-readable message out of a backend error body.
///
/// The rows API uses `message`, the auth API uses `msg`, `error_description`
/// or `error`. Anything else is returned truncated.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(serde_json::Value::as_str) {
                return text.to_string();
            }
        }
    }
    body.chars().take(200).collect()
}
