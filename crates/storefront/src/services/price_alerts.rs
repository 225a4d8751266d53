//! Price alerts ("avise-me quando baixar").

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use ecomify_core::{PriceAlertId, ProductId, UserId};

use crate::backend::{BackendClient, BackendError, Caller, Direction, Query};
use crate::catalog::Product;
use crate::models::CurrentCustomer;

const TABLE: &str = "price_alerts";

#[derive(Debug, Error)]
pub enum PriceAlertError {
    #[error("Target price must be greater than zero")]
    NonPositiveTarget,

    #[error("Target price must be below the current price of {current}")]
    TargetNotBelowCurrent { current: Decimal },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A stored alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: PriceAlertId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub target_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl PriceAlert {
    /// Whether `product` is now at or below the target.
    #[must_use]
    pub fn triggered(&self, product: &Product) -> bool {
        product.id == self.product_id && product.price <= self.target_price
    }
}

/// Body of `POST /api/price-alerts`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePriceAlert {
    pub product_id: ProductId,
    pub target_price: Decimal,
}

#[derive(Serialize)]
struct NewPriceAlert {
    user_id: UserId,
    product_id: ProductId,
    target_price: Decimal,
}

/// Check a target against the product's current price.
///
/// # Errors
///
/// Returns error if the target is not positive or not below the current price.
pub fn validate_target(product: &Product, target: Decimal) -> Result<(), PriceAlertError> {
    if target <= Decimal::ZERO {
        return Err(PriceAlertError::NonPositiveTarget);
    }
    if target >= product.price {
        return Err(PriceAlertError::TargetNotBelowCurrent {
            current: product.price,
        });
    }
    Ok(())
}

/// Price alert operations for the signed-in customer.
pub struct PriceAlerts<'a> {
    backend: &'a BackendClient,
}

impl<'a> PriceAlerts<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// The customer's alerts, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn list(&self, customer: &CurrentCustomer) -> Result<Vec<PriceAlert>, PriceAlertError> {
        let query = Query::new()
            .eq("user_id", customer.id)
            .order("created_at", Direction::Desc);
        Ok(self
            .backend
            .table(TABLE, Caller::User(&customer.access_token))
            .select(&query)
            .await?)
    }

    /// Create an alert for `product`.
    ///
    /// # Errors
    ///
    /// Returns error if the target is invalid or the backend rejects the insert.
    #[instrument(skip(self, customer, product), fields(user_id = %customer.id, product_id = %product.id))]
    pub async fn create(
        &self,
        customer: &CurrentCustomer,
        product: &Product,
        target_price: Decimal,
    ) -> Result<PriceAlert, PriceAlertError> {
        validate_target(product, target_price)?;

        let alert: PriceAlert = self
            .backend
            .table(TABLE, Caller::User(&customer.access_token))
            .insert(&NewPriceAlert {
                user_id: customer.id,
                product_id: product.id,
                target_price,
            })
            .await?;
        tracing::info!(id = %alert.id, "Price alert created");
        Ok(alert)
    }

    /// Delete one of the customer's alerts.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the delete.
    #[instrument(skip(self, customer), fields(user_id = %customer.id))]
    pub async fn delete(
        &self,
        customer: &CurrentCustomer,
        id: PriceAlertId,
    ) -> Result<(), PriceAlertError> {
        let query = Query::new().eq("id", id).eq("user_id", customer.id);
        self.backend
            .table(TABLE, Caller::User(&customer.access_token))
            .delete(&query)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::builtin_products;

    fn fone() -> Product {
        builtin_products()
            .into_iter()
            .find(|p| p.id == ProductId::new(7))
            .unwrap()
    }

    #[test]
    fn test_validate_target() {
        let product = fone(); // 249.90
        assert!(validate_target(&product, dec!(199.90)).is_ok());
        assert!(matches!(
            validate_target(&product, Decimal::ZERO),
            Err(PriceAlertError::NonPositiveTarget)
        ));
        assert!(matches!(
            validate_target(&product, dec!(249.90)),
            Err(PriceAlertError::TargetNotBelowCurrent { current }) if current == dec!(249.90)
        ));
    }

    #[test]
    fn test_triggered() {
        let mut product = fone();
        let alert = PriceAlert {
            id: PriceAlertId::generate(),
            user_id: UserId::generate(),
            product_id: product.id,
            target_price: dec!(199.90),
            created_at: Utc::now(),
        };
        assert!(!alert.triggered(&product));
        product.price = dec!(199.90);
        assert!(alert.triggered(&product));
        product.id = ProductId::new(8);
        assert!(!alert.triggered(&product));
    }
}
