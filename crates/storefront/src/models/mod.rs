//! Domain models for storefront.

pub mod session;

pub use session::{CurrentCustomer, CustomerView, keys as session_keys};
