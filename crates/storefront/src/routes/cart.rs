//! Cart route handlers.
//!
//! The cart lives in the session. Every response is the full
//! [`CartSummary`], with the stored coupon re-validated against the current
//! subtotal; a coupon that stopped applying is dropped from the session and
//! reported once through `coupon_notice`.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use ecomify_core::ProductId;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::cart::{self, CartError, CartSummary};
use crate::state::AppState;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Body of `PATCH /api/cart/items/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Body of `POST /api/cart/coupon`.
#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

/// Build the summary for the session cart.
async fn summary(state: &AppState, session: &Session) -> Result<CartSummary> {
    let cart = cart::load(session).await?;
    let code = cart::coupon_code(session).await?;

    let summary = CartSummary::build(&cart, state.coupons(), code.as_deref(), Utc::now());
    if let Some(notice) = &summary.coupon_notice {
        tracing::info!(notice = %notice, "Stored coupon no longer applies");
        cart::clear_coupon_code(session).await?;
    }
    Ok(summary)
}

/// Show the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartSummary>> {
    Ok(Json(summary(&state, &session).await?))
}

/// Add a product to the cart.
#[instrument(skip(state, session))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartSummary>> {
    let product = state
        .catalog()
        .get(body.product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Product {}", body.product_id)))?;

    let mut cart = cart::load(&session).await?;
    cart.add(&product, body.quantity)?;
    cart::save(&session, &cart).await?;

    let product_id = product.id.to_string();
    add_breadcrumb("cart", "Item added", Some(&[("product_id", product_id.as_str())]));
    Ok(Json(summary(&state, &session).await?))
}

/// Change the quantity of a line; zero removes it.
#[instrument(skip(state, session))]
pub async fn update_item(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartSummary>> {
    let mut cart = cart::load(&session).await?;

    if body.quantity == 0 {
        if !cart.remove(product_id) {
            return Err(CartError::NotInCart(product_id).into());
        }
    } else {
        let product = state
            .catalog()
            .get(product_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id}")))?;
        cart.update_quantity(&product, body.quantity)?;
    }

    cart::save(&session, &cart).await?;
    Ok(Json(summary(&state, &session).await?))
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartSummary>> {
    let mut cart = cart::load(&session).await?;
    if !cart.remove(product_id) {
        return Err(CartError::NotInCart(product_id).into());
    }
    cart::save(&session, &cart).await?;
    Ok(Json(summary(&state, &session).await?))
}

/// Empty the cart and drop its coupon.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartSummary>> {
    let mut cart = cart::load(&session).await?;
    cart.clear();
    cart::save(&session, &cart).await?;
    cart::clear_coupon_code(&session).await?;
    Ok(Json(summary(&state, &session).await?))
}

/// Apply a coupon to the cart, replacing any previous one.
#[instrument(skip(state, session, body), fields(code = %body.code))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ApplyCouponRequest>,
) -> Result<Json<CartSummary>> {
    let cart = cart::load(&session).await?;
    let applied = state
        .coupons()
        .apply(&body.code, cart.subtotal(), Utc::now())?;

    cart::set_coupon_code(&session, &applied.code).await?;
    add_breadcrumb("cart", "Coupon applied", Some(&[("code", applied.code.as_str())]));
    Ok(Json(summary(&state, &session).await?))
}

/// Remove the applied coupon.
#[instrument(skip(state, session))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartSummary>> {
    cart::clear_coupon_code(&session).await?;
    Ok(Json(summary(&state, &session).await?))
}
