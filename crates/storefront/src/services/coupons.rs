//! Coupon book and discount calculation.
//!
//! One coupon per cart, no stacking. Applying a coupon is a lookup by code
//! followed by eligibility checks against the cart subtotal; usage counters
//! are read-only here.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

use ecomify_core::round_to_cents;

/// Why a coupon cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CouponError {
    #[error("Coupon not found: {0}")]
    NotFound(String),

    #[error("Coupon is no longer active")]
    Inactive,

    #[error("Coupon has expired")]
    Expired,

    #[error("Coupon usage limit reached")]
    UsageLimitReached,

    #[error("Minimum order value for this coupon is {minimum}")]
    BelowMinimum { minimum: Decimal },
}

/// What a coupon takes off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponKind {
    /// Fraction of the subtotal, e.g. `0.10` for 10%.
    Percentage { rate: Decimal },
    /// Flat amount in BRL, capped at the subtotal.
    Fixed { amount: Decimal },
    /// Waives the shipping fee.
    FreeShipping,
}

/// A discount rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coupon {
    pub code: String,
    pub description: String,
    #[serde(flatten)]
    pub kind: CouponKind,
    pub min_order_value: Decimal,
    pub max_uses: Option<u32>,
    pub used_count: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl Coupon {
    /// Discount on `subtotal`, zero when below the minimum order value.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal < self.min_order_value {
            return Decimal::ZERO;
        }
        match &self.kind {
            CouponKind::Percentage { rate } => round_to_cents(subtotal * rate),
            CouponKind::Fixed { amount } => (*amount).min(subtotal),
            CouponKind::FreeShipping => Decimal::ZERO,
        }
    }

    #[must_use]
    pub const fn is_free_shipping(&self) -> bool {
        matches!(self.kind, CouponKind::FreeShipping)
    }

    fn check(&self, subtotal: Decimal, now: DateTime<Utc>) -> Result<(), CouponError> {
        if !self.active {
            return Err(CouponError::Inactive);
        }
        if self.expires_at.is_some_and(|expires| expires < now) {
            return Err(CouponError::Expired);
        }
        if self.max_uses.is_some_and(|max| self.used_count >= max) {
            return Err(CouponError::UsageLimitReached);
        }
        if subtotal < self.min_order_value {
            return Err(CouponError::BelowMinimum {
                minimum: self.min_order_value,
            });
        }
        Ok(())
    }
}

/// A coupon accepted for a given subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub description: String,
    pub discount: Decimal,
    pub free_shipping: bool,
}

/// The set of coupons the storefront accepts.
#[derive(Debug, Clone)]
pub struct CouponBook {
    coupons: Vec<Coupon>,
}

impl Default for CouponBook {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CouponBook {
    #[must_use]
    pub const fn new(coupons: Vec<Coupon>) -> Self {
        Self { coupons }
    }

    /// The storefront's standing promotions.
    #[must_use]
    pub fn builtin() -> Self {
        let coupon = |code: &str, description: &str, kind, min_order_value| Coupon {
            code: code.to_string(),
            description: description.to_string(),
            kind,
            min_order_value,
            max_uses: None,
            used_count: 0,
            expires_at: None,
            active: true,
        };

        Self::new(vec![
            coupon(
                "BEMVINDO10",
                "10% de desconto na primeira compra",
                CouponKind::Percentage { rate: dec!(0.10) },
                dec!(100.00),
            ),
            Coupon {
                max_uses: Some(1000),
                used_count: 532,
                expires_at: end_of_day(2027, 12, 31),
                ..coupon(
                    "TECH20",
                    "20% de desconto em compras acima de R$ 500",
                    CouponKind::Percentage { rate: dec!(0.20) },
                    dec!(500.00),
                )
            },
            coupon(
                "DESCONTO50",
                "R$ 50 de desconto em compras acima de R$ 300",
                CouponKind::Fixed {
                    amount: dec!(50.00),
                },
                dec!(300.00),
            ),
            coupon(
                "FRETEGRATIS",
                "Frete grátis em compras acima de R$ 150",
                CouponKind::FreeShipping,
                dec!(150.00),
            ),
            Coupon {
                expires_at: end_of_day(2024, 11, 29),
                ..coupon(
                    "BLACKFRIDAY",
                    "30% de desconto na Black Friday",
                    CouponKind::Percentage { rate: dec!(0.30) },
                    dec!(200.00),
                )
            },
            Coupon {
                max_uses: Some(100),
                used_count: 100,
                ..coupon(
                    "PRIMEIROS100",
                    "R$ 100 de desconto para os 100 primeiros clientes",
                    CouponKind::Fixed {
                        amount: dec!(100.00),
                    },
                    dec!(500.00),
                )
            },
            Coupon {
                active: false,
                ..coupon(
                    "VERAO15",
                    "15% de desconto na campanha de verão",
                    CouponKind::Percentage { rate: dec!(0.15) },
                    dec!(0.00),
                )
            },
        ])
    }

    /// All coupons, including inactive ones.
    #[must_use]
    pub fn all(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Coupons a customer could currently use.
    pub fn available(&self, now: DateTime<Utc>) -> impl Iterator<Item = &Coupon> {
        self.coupons
            .iter()
            .filter(move |c| c.check(c.min_order_value, now).is_ok())
    }

    /// Case-insensitive lookup; surrounding whitespace is ignored.
    #[must_use]
    pub fn find(&self, code: &str) -> Option<&Coupon> {
        let code = code.trim();
        self.coupons
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
    }

    /// Apply `code` to a cart with the given subtotal.
    ///
    /// # Errors
    ///
    /// Returns a `CouponError` naming the first failed check.
    pub fn apply(
        &self,
        code: &str,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<AppliedCoupon, CouponError> {
        let coupon = self
            .find(code)
            .ok_or_else(|| CouponError::NotFound(code.trim().to_uppercase()))?;
        coupon.check(subtotal, now)?;

        Ok(AppliedCoupon {
            code: coupon.code.clone(),
            description: coupon.description.clone(),
            discount: coupon.discount_for(subtotal),
            free_shipping: coupon.is_free_shipping(),
        })
    }
}

fn end_of_day(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_discount_is_zero_below_minimum() {
        let book = CouponBook::builtin();
        for code in ["BEMVINDO10", "TECH20", "DESCONTO50"] {
            let coupon = book.find(code).unwrap();
            let below = coupon.min_order_value - dec!(0.01);
            assert_eq!(coupon.discount_for(below), Decimal::ZERO, "{code}");
        }
    }

    #[test]
    fn test_percentage_discount_is_subtotal_times_rate() {
        let book = CouponBook::builtin();
        let coupon = book.find("BEMVINDO10").unwrap();
        for subtotal in [dec!(100.00), dec!(249.90), dec!(1299.99), dec!(8999.00)] {
            assert_eq!(
                coupon.discount_for(subtotal),
                round_to_cents(subtotal * dec!(0.10))
            );
        }
        assert_eq!(coupon.discount_for(dec!(1299.99)), dec!(130.00));
    }

    #[test]
    fn test_fixed_discount_capped_at_subtotal() {
        let coupon = Coupon {
            min_order_value: Decimal::ZERO,
            ..CouponBook::builtin().find("DESCONTO50").unwrap().clone()
        };
        assert_eq!(coupon.discount_for(dec!(30.00)), dec!(30.00));
        assert_eq!(coupon.discount_for(dec!(300.00)), dec!(50.00));
    }

    #[test]
    fn test_apply_is_case_insensitive_and_trimmed() {
        let applied = CouponBook::builtin()
            .apply("  tech20 ", dec!(1000.00), now())
            .unwrap();
        assert_eq!(applied.code, "TECH20");
        assert_eq!(applied.discount, dec!(200.00));
        assert!(!applied.free_shipping);
    }

    #[test]
    fn test_apply_free_shipping() {
        let applied = CouponBook::builtin()
            .apply("fretegratis", dec!(150.00), now())
            .unwrap();
        assert!(applied.free_shipping);
        assert_eq!(applied.discount, Decimal::ZERO);
    }

    #[test]
    fn test_apply_rejections() {
        let book = CouponBook::builtin();
        assert_eq!(
            book.apply("NOPE", dec!(500), now()),
            Err(CouponError::NotFound("NOPE".to_string()))
        );
        assert_eq!(
            book.apply("VERAO15", dec!(500), now()),
            Err(CouponError::Inactive)
        );
        assert_eq!(
            book.apply("BLACKFRIDAY", dec!(500), now()),
            Err(CouponError::Expired)
        );
        assert_eq!(
            book.apply("PRIMEIROS100", dec!(900), now()),
            Err(CouponError::UsageLimitReached)
        );
        assert_eq!(
            book.apply("TECH20", dec!(499.99), now()),
            Err(CouponError::BelowMinimum {
                minimum: dec!(500.00)
            })
        );
    }

    #[test]
    fn test_expiry_is_a_date_comparison() {
        let book = CouponBook::builtin();
        let before = Utc.with_ymd_and_hms(2024, 11, 29, 10, 0, 0).unwrap();
        assert!(book.apply("BLACKFRIDAY", dec!(500), before).is_ok());
    }

    #[test]
    fn test_available_skips_unusable() {
        let book = CouponBook::builtin();
        let codes: Vec<_> = book.available(now()).map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["BEMVINDO10", "TECH20", "DESCONTO50", "FRETEGRATIS"]);
    }

    #[test]
    fn test_coupon_serializes_kind_inline() {
        let book = CouponBook::builtin();
        let json = serde_json::to_value(book.find("BEMVINDO10").unwrap()).unwrap();
        assert_eq!(json["type"], "percentage");
        assert_eq!(json["rate"], "0.10");
        assert_eq!(json["code"], "BEMVINDO10");
    }
}
