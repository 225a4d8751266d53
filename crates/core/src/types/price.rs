//! Type-safe price representation using decimal arithmetic.
//!
//! Money is always a `Decimal` in the currency's standard unit (reais, not
//! centavos). Display follows the Brazilian convention: `R$ 1.299,90`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when building a [`Price`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices cannot be negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal, currency_code: CurrencyCode) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self {
            amount,
            currency_code,
        })
    }

    /// Create a price in Brazilian reais.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] for amounts below zero.
    pub fn brl(amount: Decimal) -> Result<Self, PriceError> {
        Self::new(amount, CurrencyCode::BRL)
    }

    /// Format for display, e.g. `R$ 1.299,90`.
    #[must_use]
    pub fn display(&self) -> String {
        format_amount(self.amount, self.currency_code)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes accepted by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::BRL => "R$",
            Self::USD => "US$",
            Self::EUR => "€",
        }
    }

    /// ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::BRL => "BRL",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}

/// Round a money amount to whole cents (half away from zero).
#[must_use]
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with `.` thousands and `,` decimal separators.
fn format_amount(amount: Decimal, currency: CurrencyCode) -> String {
    let rounded = round_to_cents(amount.abs());
    let text = format!("{rounded:.2}");
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{} {grouped},{frac_part}", currency.symbol())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_groups_thousands() {
        let price = Price::brl(dec!(1299.9)).unwrap();
        assert_eq!(price.display(), "R$ 1.299,90");

        let price = Price::brl(dec!(12345678.5)).unwrap();
        assert_eq!(price.display(), "R$ 12.345.678,50");
    }

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Price::brl(dec!(0)).unwrap().display(), "R$ 0,00");
        assert_eq!(Price::brl(dec!(19.9)).unwrap().display(), "R$ 19,90");
        assert_eq!(Price::brl(dec!(999.99)).unwrap().display(), "R$ 999,99");
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(
            Price::brl(dec!(-1)),
            Err(PriceError::Negative(dec!(-1)))
        );
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(dec!(10.005)), dec!(10.01));
        assert_eq!(round_to_cents(dec!(10.004)), dec!(10.00));
    }

    #[test]
    fn test_other_currency_symbol() {
        let price = Price::new(dec!(10), CurrencyCode::USD).unwrap();
        assert_eq!(price.to_string(), "US$ 10,00");
    }
}
