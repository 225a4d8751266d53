//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness: the process is up. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: the backend answers.
///
/// Returns 503 Service Unavailable if the backend is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.backend().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
