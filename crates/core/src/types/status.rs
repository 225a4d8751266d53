//! Status enums for orders, payments and notifications.
//!
//! Wire values are `snake_case`, matching the columns of the hosted backend.

use serde::{Deserialize, Serialize};

/// Generates `Display`, `FromStr` and `as_str` for a fieldless enum whose
/// serde names are listed explicitly.
macro_rules! wire_enum {
    ($name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire (database/JSON) value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(format!("invalid {}: {s}", stringify!($name))),
                }
            }
        }
    };
}

/// Lifecycle of an order as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

wire_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    OutForDelivery => "out_for_delivery",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Returned => "returned",
});

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Authorized,
    Paid,
    Failed,
    Refunded,
}

wire_enum!(PaymentStatus {
    Pending => "pending",
    Authorized => "authorized",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

/// Category of a customer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Order,
    Promotion,
    PriceAlert,
    Stock,
    Review,
    System,
}

wire_enum!(NotificationType {
    Order => "order",
    Promotion => "promotion",
    PriceAlert => "price_alert",
    Stock => "stock",
    Review => "review",
    System => "system",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_wire_values_match_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_notification_type_parse() {
        assert_eq!(
            "price_alert".parse::<NotificationType>().unwrap(),
            NotificationType::PriceAlert
        );
        assert!("newsletter".parse::<NotificationType>().is_err());
    }

    #[test]
    fn test_payment_status_display() {
        assert_eq!(PaymentStatus::Refunded.to_string(), "refunded");
    }
}
