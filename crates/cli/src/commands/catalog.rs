//! Backend catalog management.
//!
//! # Environment Variables
//!
//! - `ECOMIFY_BACKEND_URL` - Backend base URL
//! - `ECOMIFY_BACKEND_ANON_KEY` - Anonymous key
//! - `ECOMIFY_BACKEND_SERVICE_KEY` - Service key (required: the products
//!   table is not writable with the anonymous key)

use ecomify_storefront::backend::{BackendClient, BackendError, Caller};
use ecomify_storefront::catalog::builtin_products;
use ecomify_storefront::config::{BackendConfig, ConfigError};
use thiserror::Error;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("ECOMIFY_BACKEND_SERVICE_KEY must be set to write the catalog")]
    MissingServiceKey,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Upsert the built-in catalog into the backend `products` table.
///
/// # Errors
///
/// Returns an error if configuration is missing or the backend rejects the
/// write.
pub async fn seed() -> Result<(), CatalogError> {
    dotenvy::dotenv().ok();

    let config = BackendConfig::from_env()?;
    if config.service_key.is_none() {
        return Err(CatalogError::MissingServiceKey);
    }

    let client = BackendClient::new(&config)?;
    let products = builtin_products();

    tracing::info!(count = products.len(), backend = %config.url, "Seeding catalog");
    client
        .table("products", Caller::Service)
        .upsert(&products)
        .await?;
    tracing::info!("Catalog seeded");
    Ok(())
}
