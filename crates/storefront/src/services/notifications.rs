//! Customer notifications.
//!
//! Rows live in the backend `notifications` table. Other services (order
//! pipeline, price watcher) create them through `POST
//! /api/notifications/create`, which inserts with the service key; customers
//! read and manage their own rows under their access token.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use ecomify_core::{NotificationId, NotificationType};

use crate::backend::{BackendClient, BackendError, Caller, Direction, Query};
use crate::models::CurrentCustomer;

const TABLE: &str = "notifications";

/// Default page size for the notification list.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid notification type: {0}")]
    InvalidType(String),

    #[error("Notification not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A stored notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/notifications/create`.
///
/// Every field is optional at the wire level so that missing fields are
/// reported as one validation error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub data: Option<Value>,
}

/// A validated notification ready to insert.
#[derive(Debug, Clone, Serialize)]
pub struct NewNotification {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub read: bool,
}

impl CreateNotificationRequest {
    /// Check required fields and the notification type.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` if `userId`, `type`, `title` or `message` is
    /// absent or blank, and `InvalidType` for an unknown type.
    pub fn validate(self) -> Result<NewNotification, NotificationError> {
        let (Some(user_id), Some(kind), Some(title), Some(message)) = (
            present(self.user_id),
            present(self.kind),
            present(self.title),
            present(self.message),
        ) else {
            return Err(NotificationError::MissingFields);
        };

        let kind = kind
            .parse::<NotificationType>()
            .map_err(|_| NotificationError::InvalidType(kind))?;

        Ok(NewNotification {
            user_id,
            kind,
            title,
            message,
            data: self
                .data
                .filter(|d| !d.is_null())
                .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            read: false,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Serialize)]
struct ReadPatch {
    read: bool,
}

/// Notification operations against the backend.
pub struct Notifications<'a> {
    backend: &'a BackendClient,
}

impl<'a> Notifications<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// Insert a notification with the service key.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the insert.
    #[instrument(skip(self, notification), fields(user_id = %notification.user_id, kind = %notification.kind))]
    pub async fn create(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, NotificationError> {
        let created: Notification = self
            .backend
            .table(TABLE, Caller::Service)
            .insert(notification)
            .await?;
        tracing::info!(id = %created.id, "Notification created");
        Ok(created)
    }

    /// The customer's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn list(
        &self,
        customer: &CurrentCustomer,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, NotificationError> {
        let mut query = Query::new().eq("user_id", customer.id);
        if unread_only {
            query = query.eq("read", false);
        }
        let query = query.order("created_at", Direction::Desc).limit(limit);

        Ok(self
            .backend
            .table(TABLE, Caller::User(&customer.access_token))
            .select(&query)
            .await?)
    }

    /// Number of unread notifications.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn unread_count(&self, customer: &CurrentCustomer) -> Result<usize, NotificationError> {
        let query = Query::new()
            .columns("id")
            .eq("user_id", customer.id)
            .eq("read", false);
        let rows: Vec<IgnoredAny> = self
            .backend
            .table(TABLE, Caller::User(&customer.access_token))
            .select(&query)
            .await?;
        Ok(rows.len())
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the customer has no notification with this ID.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn mark_read(
        &self,
        customer: &CurrentCustomer,
        id: NotificationId,
    ) -> Result<Notification, NotificationError> {
        let query = Query::new().eq("id", id).eq("user_id", customer.id);
        let updated: Vec<Notification> = self
            .backend
            .table(TABLE, Caller::User(&customer.access_token))
            .update(&query, &ReadPatch { read: true })
            .await?;
        updated.into_iter().next().ok_or(NotificationError::NotFound)
    }

    /// Mark every unread notification read. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the update.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn mark_all_read(&self, customer: &CurrentCustomer) -> Result<usize, NotificationError> {
        let query = Query::new()
            .eq("user_id", customer.id)
            .eq("read", false);
        let updated: Vec<Notification> = self
            .backend
            .table(TABLE, Caller::User(&customer.access_token))
            .update(&query, &ReadPatch { read: true })
            .await?;
        Ok(updated.len())
    }

    /// Delete one notification.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the delete.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn delete(
        &self,
        customer: &CurrentCustomer,
        id: NotificationId,
    ) -> Result<(), NotificationError> {
        let query = Query::new().eq("id", id).eq("user_id", customer.id);
        self.backend
            .table(TABLE, Caller::User(&customer.access_token))
            .delete(&query)
            .await?;
        Ok(())
    }
}
