//! Wishlist route handlers.
//!
//! Works for guests and signed-in customers alike; [`Wishlist`] decides
//! where the list is stored.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use ecomify_core::ProductId;

use crate::catalog::Product;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::services::wishlist::{self, Wishlist};
use crate::state::AppState;

/// Body of `POST /api/wishlist`.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: ProductId,
}

/// Result of a toggle.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub product_id: ProductId,
    pub saved: bool,
}

async fn ensure_product(state: &AppState, id: ProductId) -> Result<()> {
    state
        .catalog()
        .get(id)
        .await
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
}

async fn saved_products(state: &AppState, list: &Wishlist<'_>) -> Result<Vec<Product>> {
    let ids = list.product_ids().await?;
    let products = state.catalog().products().await;
    Ok(wishlist::resolve(&ids, &products))
}

/// Saved products.
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    session: Session,
) -> Result<Json<Vec<Product>>> {
    let list = Wishlist::new(&session, state.backend(), customer.as_ref());
    Ok(Json(saved_products(&state, &list).await?))
}

/// Save a product.
#[instrument(skip(state, session, customer))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    session: Session,
    Json(body): Json<AddRequest>,
) -> Result<Json<Vec<Product>>> {
    ensure_product(&state, body.product_id).await?;
    let list = Wishlist::new(&session, state.backend(), customer.as_ref());
    list.add(body.product_id).await?;
    Ok(Json(saved_products(&state, &list).await?))
}

/// Remove a product.
#[instrument(skip(state, session, customer))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<Product>>> {
    let list = Wishlist::new(&session, state.backend(), customer.as_ref());
    list.remove(product_id).await?;
    Ok(Json(saved_products(&state, &list).await?))
}

/// Save the product if missing, remove it otherwise.
#[instrument(skip(state, session, customer))]
pub async fn toggle(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ToggleResponse>> {
    ensure_product(&state, product_id).await?;
    let saved = Wishlist::new(&session, state.backend(), customer.as_ref())
        .toggle(product_id)
        .await?;
    Ok(Json(ToggleResponse { product_id, saved }))
}
