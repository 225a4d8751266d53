//! Notification route handlers.
//!
//! `POST /api/notifications/create` is called by other services (order
//! pipeline, price watcher) and inserts with the service key. The remaining
//! endpoints act on the signed-in customer's own notifications.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use ecomify_core::NotificationId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::notifications::{
    CreateNotificationRequest, DEFAULT_LIST_LIMIT, Notification, Notifications,
};
use crate::state::AppState;

/// Query string of the notification list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<usize>,
}

/// Unread badge count.
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: usize,
}

/// Create a notification for any user.
///
/// Responds `200 {"success": true, "notification": {...}}`, or 400 when a
/// required field is missing or the type is unknown.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateNotificationRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected notification body");
        AppError::BadRequest("Invalid JSON body".to_string())
    })?;

    let notification = request.validate()?;
    let created = Notifications::new(state.backend())
        .create(&notification)
        .await?;

    Ok(Json(json!({ "success": true, "notification": created })))
}

/// The customer's notifications, newest first.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(DEFAULT_LIST_LIMIT);
    let notifications = Notifications::new(state.backend())
        .list(&customer, query.unread_only, limit)
        .await?;
    Ok(Json(notifications))
}

/// Number of unread notifications.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn unread_count(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<UnreadCount>> {
    let count = Notifications::new(state.backend())
        .unread_count(&customer)
        .await?;
    Ok(Json(UnreadCount { count }))
}

/// Mark one notification read.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>> {
    let notification = Notifications::new(state.backend())
        .mark_read(&customer, id)
        .await?;
    Ok(Json(notification))
}

/// Mark every notification read.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
) -> Result<Json<Value>> {
    let updated = Notifications::new(state.backend())
        .mark_all_read(&customer)
        .await?;
    Ok(Json(json!({ "updated": updated })))
}

/// Delete one notification.
#[instrument(skip(state, customer), fields(user_id = %customer.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    Notifications::new(state.backend())
        .delete(&customer, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
