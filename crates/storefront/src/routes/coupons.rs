//! Coupon listing.

use axum::{Json, extract::State};
use chrono::Utc;

use crate::services::coupons::Coupon;
use crate::state::AppState;

/// Coupons a customer can currently use: active, unexpired and not used up.
pub async fn index(State(state): State<AppState>) -> Json<Vec<Coupon>> {
    Json(state.coupons().available(Utc::now()).cloned().collect())
}
