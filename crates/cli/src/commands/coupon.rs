//! Coupon evaluation against the built-in coupon book.

use chrono::Utc;
use ecomify_storefront::services::coupons::{CouponBook, CouponError, CouponKind};
use rust_decimal::Decimal;

use super::brl;

/// Apply `code` to `subtotal` and print the outcome.
///
/// # Errors
///
/// Returns the rejection if the coupon does not apply.
#[allow(clippy::print_stdout)]
pub fn apply(code: &str, subtotal: Decimal) -> Result<(), CouponError> {
    let book = CouponBook::builtin();
    let applied = book.apply(code, subtotal, Utc::now())?;

    println!("{} - {}", applied.code, applied.description);
    println!("  Subtotal:      {}", brl(subtotal));
    println!("  Desconto:      {}", brl(applied.discount));
    println!(
        "  Frete grátis:  {}",
        if applied.free_shipping { "sim" } else { "não" }
    );
    println!("  Com desconto:  {}", brl(subtotal - applied.discount));
    Ok(())
}

/// Print the coupon book.
#[allow(clippy::print_stdout)]
pub fn list() {
    let book = CouponBook::builtin();
    let now = Utc::now();
    let usable: Vec<&str> = book.available(now).map(|c| c.code.as_str()).collect();

    for coupon in book.all() {
        let kind = match &coupon.kind {
            CouponKind::Percentage { rate } => format!("{}%", rate * Decimal::ONE_HUNDRED),
            CouponKind::Fixed { amount } => brl(*amount),
            CouponKind::FreeShipping => "frete grátis".to_string(),
        };
        let status = if usable.contains(&coupon.code.as_str()) {
            "ativo"
        } else {
            "indisponível"
        };
        println!(
            "{:<14} {:<14} mín. {:<14} {status}",
            coupon.code,
            kind,
            brl(coupon.min_order_value)
        );
    }
}
