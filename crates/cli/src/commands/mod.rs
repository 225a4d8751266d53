//! CLI subcommands.

pub mod catalog;
pub mod coupon;
pub mod search;

use ecomify_core::Price;
use rust_decimal::Decimal;

/// Format an amount as `R$ 1.234,56`.
fn brl(amount: Decimal) -> String {
    Price::brl(amount).map_or_else(|_| format!("R$ {amount}"), |p| p.display())
}
