//! Order history handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use ecomify_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::orders::{OrderView, Orders};
use crate::state::AppState;

/// The customer's orders, newest first.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = Orders::new(state.backend()).list(&customer).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// One order with its status timeline.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>> {
    let order = Orders::new(state.backend()).get(&customer, id).await?;
    Ok(Json(order.into()))
}
