//! Price alert handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use ecomify_core::PriceAlertId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::price_alerts::{CreatePriceAlert, PriceAlert, PriceAlerts};
use crate::state::AppState;

/// The customer's alerts.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<PriceAlert>>> {
    Ok(Json(PriceAlerts::new(state.backend()).list(&customer).await?))
}

/// Create an alert; the target must be below the current price.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Json(body): Json<CreatePriceAlert>,
) -> Result<(StatusCode, Json<PriceAlert>)> {
    let product = state
        .catalog()
        .get(body.product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Product {}", body.product_id)))?;

    let alert = PriceAlerts::new(state.backend())
        .create(&customer, &product, body.target_price)
        .await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// Delete an alert.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<PriceAlertId>,
) -> Result<StatusCode> {
    PriceAlerts::new(state.backend())
        .delete(&customer, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
