//! Session-related types.
//!
//! Everything the storefront remembers about a visitor lives in the
//! tower-sessions session: the signed-in customer, the cart, the guest
//! wishlist and OAuth round-trip state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecomify_core::{Email, UserId};

/// Session-stored customer identity.
///
/// Carries the backend tokens so customer-scoped backend calls run under the
/// customer's own row-level permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Backend user ID.
    pub id: UserId,
    /// Customer email address.
    pub email: Email,
    /// Display name from the sign-up metadata.
    pub full_name: Option<String>,
    /// Backend access token (bearer for customer-scoped calls).
    pub access_token: String,
    /// Backend refresh token.
    pub refresh_token: String,
    /// When the access token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl CurrentCustomer {
    /// Whether the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Public view of the signed-in customer (no tokens).
#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
    pub id: UserId,
    pub email: Email,
    pub full_name: Option<String>,
}

impl From<&CurrentCustomer> for CustomerView {
    fn from(customer: &CurrentCustomer) -> Self {
        Self {
            id: customer.id,
            email: customer.email.clone(),
            full_name: customer.full_name.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the session cart.
    pub const CART: &str = "cart";

    /// Key for the coupon code applied to the cart.
    pub const CART_COUPON: &str = "cart_coupon";

    /// Key for the guest wishlist.
    pub const WISHLIST: &str = "wishlist";

    /// Key for the PKCE verifier between OAuth redirect and callback.
    pub const OAUTH_VERIFIER: &str = "oauth_verifier";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer(expires_at: DateTime<Utc>) -> CurrentCustomer {
        CurrentCustomer {
            id: UserId::generate(),
            email: Email::parse("ana@ecomify.com.br").unwrap(),
            full_name: None,
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_at,
        }
    }

    #[test]
    fn test_is_expired() {
        assert!(customer(Utc::now() - chrono::Duration::minutes(1)).is_expired());
        assert!(!customer(Utc::now() + chrono::Duration::minutes(5)).is_expired());
    }

    #[test]
    fn test_view_hides_tokens() {
        let view = CustomerView::from(&customer(Utc::now()));
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("access_token"));
        assert!(json.contains("ana@ecomify.com.br"));
    }
}
