//! Order history.
//!
//! Orders are written by checkout outside this service; the storefront only
//! reads the customer's own rows and maps their status to what the order
//! pages show. There is no client-side transition logic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use ecomify_core::{OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

use crate::backend::{BackendClient, BackendError, Caller, Direction, Query};
use crate::models::CurrentCustomer;

const TABLE: &str = "orders";

/// Order lookup errors.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found")]
    NotFound,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Brazilian postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub recipient: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter UF, e.g. `SP`.
    pub state: String,
    /// CEP, `00000-000`.
    pub postal_code: String,
}

/// A customer order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub shipping: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub tracking_code: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Status display
// =============================================================================

/// Badge colour used for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    Neutral,
    Info,
    Primary,
    Warning,
    Success,
    Danger,
}

/// How an order status is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub tone: BadgeTone,
    /// Position on the delivery track (1-5); `None` off the track.
    pub step: Option<u8>,
    pub is_terminal: bool,
    pub can_cancel: bool,
}

/// Labels of the delivery track, in order.
pub const TRACK: [&str; 5] = [
    "Pedido realizado",
    "Pagamento confirmado",
    "Em preparação",
    "Enviado",
    "Entregue",
];

/// Presentation of an order status.
#[must_use]
pub const fn status_display(status: OrderStatus) -> StatusDisplay {
    let (label, tone, step) = match status {
        OrderStatus::Pending => ("Pendente", BadgeTone::Warning, Some(1)),
        OrderStatus::Confirmed => ("Confirmado", BadgeTone::Info, Some(2)),
        OrderStatus::Processing => ("Em preparação", BadgeTone::Info, Some(3)),
        OrderStatus::Shipped => ("Enviado", BadgeTone::Primary, Some(4)),
        OrderStatus::OutForDelivery => ("Saiu para entrega", BadgeTone::Primary, Some(4)),
        OrderStatus::Delivered => ("Entregue", BadgeTone::Success, Some(5)),
        OrderStatus::Cancelled => ("Cancelado", BadgeTone::Danger, None),
        OrderStatus::Returned => ("Devolvido", BadgeTone::Neutral, None),
    };

    StatusDisplay {
        label,
        tone,
        step,
        is_terminal: matches!(
            status,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returned
        ),
        can_cancel: matches!(status, OrderStatus::Pending | OrderStatus::Confirmed),
    }
}

/// Customer-facing payment status label.
#[must_use]
pub const fn payment_label(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "Aguardando pagamento",
        PaymentStatus::Authorized => "Pagamento autorizado",
        PaymentStatus::Paid => "Pago",
        PaymentStatus::Failed => "Pagamento recusado",
        PaymentStatus::Refunded => "Reembolsado",
    }
}

/// State of one track step relative to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Completed,
    Current,
    Upcoming,
}

/// One step of the delivery timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub label: &'static str,
    pub state: StepState,
}

/// Delivery timeline; empty for orders off the track.
#[must_use]
pub fn timeline(status: OrderStatus) -> Vec<TimelineStep> {
    let display = status_display(status);
    let Some(current) = display.step else {
        return Vec::new();
    };

    (1u8..)
        .zip(TRACK)
        .map(|(step, label)| {
            let state = if step < current || (step == current && display.is_terminal) {
                StepState::Completed
            } else if step == current {
                StepState::Current
            } else {
                StepState::Upcoming
            };
            TimelineStep { label, state }
        })
        .collect()
}

/// Order as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub status_display: StatusDisplay,
    pub payment_label: &'static str,
    pub timeline: Vec<TimelineStep>,
    pub item_count: u32,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            status_display: status_display(order.status),
            payment_label: payment_label(order.payment_status),
            timeline: timeline(order.status),
            item_count: order.items.iter().map(|i| i.quantity).sum(),
            order,
        }
    }
}

// =============================================================================
// Backend access
// =============================================================================

/// Order reads for the signed-in customer.
pub struct Orders<'a> {
    backend: &'a BackendClient,
}

impl<'a> Orders<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// The customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn list(&self, customer: &CurrentCustomer) -> Result<Vec<Order>, OrderError> {
        let query = Query::new()
            .eq("user_id", customer.id)
            .order("created_at", Direction::Desc);
        Ok(self
            .backend
            .table(TABLE, Caller::User(&customer.access_token))
            .select(&query)
            .await?)
    }

    /// One of the customer's orders.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist or belongs to someone
    /// else.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn get(&self, customer: &CurrentCustomer, id: OrderId) -> Result<Order, OrderError> {
        let query = Query::new().eq("id", id).eq("user_id", customer.id);
        self.backend
            .table(TABLE, Caller::User(&customer.access_token))
            .select_one(&query)
            .await
            .map_err(|e| match e {
                BackendError::NotFound(_) => OrderError::NotFound,
                other => OrderError::Backend(other),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_track_steps_increase_along_the_happy_path() {
        let steps: Vec<_> = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ]
        .into_iter()
        .map(|s| status_display(s).step.unwrap())
        .collect();
        assert_eq!(steps, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_off_track_statuses() {
        for status in [OrderStatus::Cancelled, OrderStatus::Returned] {
            let display = status_display(status);
            assert_eq!(display.step, None);
            assert!(display.is_terminal);
            assert!(!display.can_cancel);
            assert!(timeline(status).is_empty());
        }
    }

    #[test]
    fn test_can_cancel_only_before_processing() {
        let cancellable: Vec<_> = OrderStatus::ALL
            .iter()
            .copied()
            .filter(|s| status_display(*s).can_cancel)
            .collect();
        assert_eq!(cancellable, vec![OrderStatus::Pending, OrderStatus::Confirmed]);
    }

    #[test]
    fn test_timeline_marks_current_step() {
        let steps = timeline(OrderStatus::Processing);
        assert_eq!(steps.len(), TRACK.len());
        let states: Vec<_> = steps.iter().map(|s| s.state).collect();
        assert_eq!(
            states,
            vec![
                StepState::Completed,
                StepState::Completed,
                StepState::Current,
                StepState::Upcoming,
                StepState::Upcoming,
            ]
        );
    }

    #[test]
    fn test_delivered_timeline_is_complete() {
        assert!(timeline(OrderStatus::Delivered)
            .iter()
            .all(|s| s.state == StepState::Completed));
    }

    #[test]
    fn test_order_view_from_backend_row() {
        let row = serde_json::json!({
            "id": 1042,
            "user_id": "2f1b6c1e-8c0a-4f57-9a51-3d8a3c6f0b11",
            "status": "out_for_delivery",
            "payment_status": "paid",
            "payment_method": "pix",
            "items": [
                {"product_id": 7, "name": "Fone JBL Tune 520BT", "quantity": 2, "unit_price": "249.90"}
            ],
            "shipping_address": {
                "recipient": "Ana Souza",
                "street": "Av. Paulista",
                "number": "1000",
                "neighborhood": "Bela Vista",
                "city": "São Paulo",
                "state": "SP",
                "postal_code": "01310-100"
            },
            "subtotal": "499.80",
            "total": "499.80",
            "tracking_code": "BR123456789BR",
            "created_at": "2026-03-01T10:00:00Z"
        });
        let order: Order = serde_json::from_value(row).unwrap();
        let view = OrderView::from(order);

        assert_eq!(view.status_display.label, "Saiu para entrega");
        assert_eq!(view.payment_label, "Pago");
        assert_eq!(view.item_count, 2);
        assert_eq!(view.order.shipping, Decimal::ZERO);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "out_for_delivery");
        assert_eq!(json["status_display"]["step"], 4);
        assert_eq!(json["status_display"]["tone"], "primary");
    }
}
