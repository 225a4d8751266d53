//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer authentication against the backend auth API
//! - `cart` - Session cart and totals
//! - `coupons` - Coupon book and discount calculation
//! - `wishlist` - Saved products (session for guests, backend for customers)
//! - `notifications` - Customer notifications
//! - `orders` - Order history and status display
//! - `price_alerts` - Price drop alerts
//! - `reviews` - Product reviews

pub mod auth;
pub mod cart;
pub mod coupons;
pub mod notifications;
pub mod orders;
pub mod price_alerts;
pub mod reviews;
pub mod wishlist;
