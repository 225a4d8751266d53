//! Session cart.
//!
//! The cart lives in the customer's session under `cart`; the applied coupon
//! code lives next to it under `cart_coupon` and is re-validated against the
//! current subtotal every time the cart is summarized.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;

use ecomify_core::ProductId;

use crate::catalog::Product;
use crate::models::session_keys;
use crate::services::coupons::{AppliedCoupon, CouponBook};

/// Flat shipping fee in BRL.
pub const SHIPPING_FEE: Decimal = dec!(19.90);

/// Subtotal from which shipping is free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = dec!(299.00);

/// Cart mutation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Product is out of stock")]
    OutOfStock,

    #[error("Only {available} units available")]
    InsufficientStock { available: u32 },

    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// One cart line. `unit_price` is the price when the product was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Cart contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add `quantity` units, merging with an existing line for the product.
    ///
    /// # Errors
    ///
    /// Returns error if `quantity` is zero or the merged quantity exceeds stock.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if !product.in_stock() {
            return Err(CartError::OutOfStock);
        }

        let existing = self.items.iter().position(|i| i.product_id == product.id);
        let current = existing
            .and_then(|idx| self.items.get(idx))
            .map_or(0, |item| item.quantity);
        let wanted = current.saturating_add(quantity);
        if wanted > product.stock {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            });
        }

        match existing.and_then(|idx| self.items.get_mut(idx)) {
            Some(item) => item.quantity = wanted,
            None => self.items.push(CartItem {
                product_id: product.id,
                name: product.name.clone(),
                quantity,
                unit_price: product.price,
                image_url: product.image_url.clone(),
            }),
        }
        Ok(())
    }

    /// Set the quantity of a line; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns error if the product is not in the cart or stock is insufficient.
    pub fn update_quantity(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return if self.remove(product.id) {
                Ok(())
            } else {
                Err(CartError::NotInCart(product.id))
            };
        }
        if quantity > product.stock {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            });
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id)
            .ok_or(CartError::NotInCart(product.id))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Σ `unit_price × quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Σ `quantity`.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Price breakdown with an optional coupon.
    #[must_use]
    pub fn totals(&self, coupon: Option<&AppliedCoupon>) -> CartTotals {
        let subtotal = self.subtotal();
        let discount = coupon.map_or(Decimal::ZERO, |c| c.discount.min(subtotal));
        let free_shipping = self.is_empty()
            || subtotal >= FREE_SHIPPING_THRESHOLD
            || coupon.is_some_and(|c| c.free_shipping);
        let shipping = if free_shipping {
            Decimal::ZERO
        } else {
            SHIPPING_FEE
        };
        let total = (subtotal - discount + shipping).max(Decimal::ZERO);

        CartTotals {
            subtotal,
            discount,
            shipping,
            total,
        }
    }
}

/// Cart price breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Cart line as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub line_total: Decimal,
}

/// Cart as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub item_count: u32,
    #[serde(flatten)]
    pub totals: CartTotals,
    pub coupon: Option<AppliedCoupon>,
    /// Set when a stored coupon no longer applies and was dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_notice: Option<String>,
}

impl CartSummary {
    /// Summarize `cart`, re-validating `coupon_code` against its subtotal.
    #[must_use]
    pub fn build(
        cart: &Cart,
        coupons: &CouponBook,
        coupon_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let (coupon, coupon_notice) = match coupon_code {
            Some(code) => match coupons.apply(code, cart.subtotal(), now) {
                Ok(applied) => (Some(applied), None),
                Err(e) => (None, Some(e.to_string())),
            },
            None => (None, None),
        };

        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartLine {
                    item: item.clone(),
                    line_total: item.line_total(),
                })
                .collect(),
            item_count: cart.item_count(),
            totals: cart.totals(coupon.as_ref()),
            coupon,
            coupon_notice,
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Read the cart from the session; a missing cart is empty.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load(session: &Session) -> Result<Cart, tower_sessions::session::Error> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// The coupon code stored with the cart, if any.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn coupon_code(session: &Session) -> Result<Option<String>, tower_sessions::session::Error> {
    session.get::<String>(session_keys::CART_COUPON).await
}

/// Store the applied coupon code.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_coupon_code(
    session: &Session,
    code: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_COUPON, code).await
}

/// Drop the applied coupon code.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_coupon_code(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<String>(session_keys::CART_COUPON)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::builtin_products;

    fn product(id: i32) -> Product {
        builtin_products()
            .into_iter()
            .find(|p| p.id == ProductId::new(id))
            .unwrap()
    }

    fn expected_subtotal(cart: &Cart) -> Decimal {
        cart.items()
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum()
    }

    #[test]
    fn test_subtotal_tracks_every_mutation() {
        let fone = product(7);
        let mouse = product(14);
        let iphone = product(1);
        let mut cart = Cart::default();

        cart.add(&fone, 2).unwrap();
        assert_eq!(cart.subtotal(), expected_subtotal(&cart));
        cart.add(&mouse, 1).unwrap();
        cart.add(&fone, 1).unwrap();
        assert_eq!(cart.subtotal(), expected_subtotal(&cart));
        assert_eq!(cart.subtotal(), dec!(249.90) * dec!(3) + dec!(299.90));
        cart.add(&iphone, 1).unwrap();
        cart.update_quantity(&mouse, 4).unwrap();
        assert_eq!(cart.subtotal(), expected_subtotal(&cart));
        assert!(cart.remove(fone.id));
        assert_eq!(cart.subtotal(), expected_subtotal(&cart));
        cart.update_quantity(&iphone, 0).unwrap();
        assert_eq!(cart.subtotal(), dec!(299.90) * dec!(4));
        assert_eq!(cart.item_count(), 4);
        cart.clear();
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_add_merges_lines() {
        let fone = product(7);
        let mut cart = Cart::default();
        cart.add(&fone, 1).unwrap();
        cart.add(&fone, 2).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_rejections() {
        let mut cart = Cart::default();
        assert_eq!(cart.add(&product(7), 0), Err(CartError::InvalidQuantity));
        assert_eq!(cart.add(&product(6), 1), Err(CartError::OutOfStock));

        let tv = product(12); // stock 6
        cart.add(&tv, 5).unwrap();
        assert_eq!(
            cart.add(&tv, 2),
            Err(CartError::InsufficientStock { available: 6 })
        );
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_update_missing_line() {
        let mut cart = Cart::default();
        let fone = product(7);
        assert_eq!(
            cart.update_quantity(&fone, 2),
            Err(CartError::NotInCart(fone.id))
        );
        assert_eq!(
            cart.update_quantity(&fone, 0),
            Err(CartError::NotInCart(fone.id))
        );
        assert!(!cart.remove(fone.id));
    }

    #[test]
    fn test_shipping_rules() {
        let mut cart = Cart::default();
        assert_eq!(cart.totals(None).shipping, Decimal::ZERO);

        cart.add(&product(7), 1).unwrap(); // 249.90
        let totals = cart.totals(None);
        assert_eq!(totals.shipping, SHIPPING_FEE);
        assert_eq!(totals.total, dec!(269.80));

        cart.add(&product(15), 1).unwrap(); // +279.00
        assert_eq!(cart.totals(None).shipping, Decimal::ZERO);
    }

    #[test]
    fn test_totals_with_coupons() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let book = CouponBook::builtin();
        let mut cart = Cart::default();
        cart.add(&product(7), 1).unwrap(); // 249.90

        let free = book.apply("FRETEGRATIS", cart.subtotal(), now).unwrap();
        let totals = cart.totals(Some(&free));
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dec!(249.90));

        let pct = book.apply("BEMVINDO10", cart.subtotal(), now).unwrap();
        let totals = cart.totals(Some(&pct));
        assert_eq!(totals.discount, dec!(24.99));
        assert_eq!(totals.total, dec!(249.90) - dec!(24.99) + SHIPPING_FEE);
    }

    #[test]
    fn test_total_never_negative() {
        let mut cart = Cart::default();
        cart.add(&product(7), 1).unwrap();
        let huge = AppliedCoupon {
            code: "X".to_string(),
            description: String::new(),
            discount: dec!(10000),
            free_shipping: true,
        };
        let totals = cart.totals(Some(&huge));
        assert_eq!(totals.discount, cart.subtotal());
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_summary_drops_coupon_below_minimum() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        let mut cart = Cart::default();
        cart.add(&product(7), 1).unwrap();

        let summary = CartSummary::build(&cart, &CouponBook::builtin(), Some("TECH20"), now);
        assert!(summary.coupon.is_none());
        assert!(summary.coupon_notice.is_some());
        assert_eq!(summary.totals.discount, Decimal::ZERO);
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items[0].line_total, dec!(249.90));
    }

    #[test]
    fn test_cart_round_trips_through_json() {
        let mut cart = Cart::default();
        cart.add(&product(1), 1).unwrap();
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }
}
