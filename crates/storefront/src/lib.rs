//! Ecomify storefront library.
//!
//! The storefront's server side: catalog, search and recommendations, the
//! session cart with coupons, wishlist, notifications, order history and
//! customer authentication against the hosted backend. Exposed as a library
//! so the binary, the CLI and the integration tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
