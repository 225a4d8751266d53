//! Ecomify Core - Shared domain types.
//!
//! This crate provides the types shared by every Ecomify component:
//! - `storefront` - The storefront HTTP service
//! - `cli` - Command-line tools for coupons, search and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients, no backend access. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
