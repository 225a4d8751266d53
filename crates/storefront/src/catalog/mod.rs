//! Product catalog.
//!
//! Products come either from the catalog compiled into the binary or from
//! the backend `products` table. Backend reads are cached with `moka`. If the
//! backend is unreachable the built-in catalog is served for that request
//! only and the next read retries the backend.

pub mod recommendations;
pub mod search;
mod seed;

use std::sync::Arc;

use moka::future::Cache;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ecomify_core::{Price, ProductId, round_to_cents};

use crate::backend::{BackendClient, BackendError, Caller, Direction, Query};
use crate::config::{CatalogConfig, CatalogSource};

pub use seed::builtin_products;

/// A product as displayed by the storefront.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Current selling price in BRL.
    pub price: Decimal,
    /// List price before markdown, when the product is on sale.
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub brand: String,
    pub category: String,
    pub rating: f64,
    pub review_count: u32,
    pub stock: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Markdown against the list price, as a whole percentage.
    #[must_use]
    pub fn discount_percentage(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= self.price || original.is_zero() {
            return None;
        }
        ((original - self.price) / original * Decimal::ONE_HUNDRED)
            .round()
            .to_u32()
    }

    /// Price formatted for display.
    #[must_use]
    pub fn display_price(&self) -> String {
        Price::brl(round_to_cents(self.price))
            .map(|p| p.display())
            .unwrap_or_default()
    }

    /// Popularity used by best-seller ranking.
    #[must_use]
    pub fn popularity(&self) -> f64 {
        f64::from(self.review_count) * self.rating
    }
}

/// Cached product catalog.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    source: CatalogSource,
    backend: BackendClient,
    cache: Cache<(), Arc<Vec<Product>>>,
}

impl Catalog {
    /// Create a catalog reading from the configured source.
    #[must_use]
    pub fn new(config: &CatalogConfig, backend: BackendClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogInner {
                source: config.source,
                backend,
                cache,
            }),
        }
    }

    /// All products, ordered by ID.
    pub async fn products(&self) -> Arc<Vec<Product>> {
        match self.inner.cache.try_get_with((), self.load()).await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "Catalog load failed, serving built-in catalog");
                Arc::new(builtin_products())
            }
        }
    }

    /// Look up one product.
    pub async fn get(&self, id: ProductId) -> Option<Product> {
        self.products().await.iter().find(|p| p.id == id).cloned()
    }

    #[instrument(skip(self), fields(source = ?self.inner.source))]
    async fn load(&self) -> Result<Arc<Vec<Product>>, BackendError> {
        let products = match self.inner.source {
            CatalogSource::Builtin => builtin_products(),
            CatalogSource::Backend => {
                let query = Query::new().order("id", Direction::Asc);
                let products = self
                    .inner
                    .backend
                    .table("products", Caller::Anonymous)
                    .select::<Product>(&query)
                    .await?;
                if products.is_empty() {
                    tracing::warn!("Backend catalog is empty, serving built-in catalog");
                    builtin_products()
                } else {
                    tracing::info!(count = products.len(), "Catalog loaded from backend");
                    products
                }
            }
        };
        Ok(Arc::new(products))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(price: Decimal, original: Option<Decimal>) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Fone Bluetooth".to_string(),
            slug: "fone-bluetooth".to_string(),
            description: "Fone sem fio".to_string(),
            price,
            original_price: original,
            brand: "JBL".to_string(),
            category: "Áudio".to_string(),
            rating: 4.5,
            review_count: 10,
            stock: 0,
            tags: vec![],
            featured: false,
            image_url: None,
        }
    }

    #[test]
    fn test_discount_percentage() {
        assert_eq!(product(dec!(75), Some(dec!(100))).discount_percentage(), Some(25));
        assert_eq!(product(dec!(100), Some(dec!(100))).discount_percentage(), None);
        assert_eq!(product(dec!(100), None).discount_percentage(), None);
    }

    #[test]
    fn test_display_price_and_stock() {
        let p = product(dec!(1299.9), None);
        assert_eq!(p.display_price(), "R$ 1.299,90");
        assert!(!p.in_stock());
    }

    #[test]
    fn test_deserialize_backend_row_with_numeric_price() {
        let row = serde_json::json!({
            "id": 7,
            "name": "Mouse Gamer",
            "slug": "mouse-gamer",
            "description": "RGB",
            "price": 199.9,
            "brand": "Logitech",
            "category": "Acessórios",
            "rating": 4.6,
            "review_count": 120,
            "stock": 3
        });
        let product: Product = serde_json::from_value(row).unwrap();
        assert_eq!(product.price, dec!(199.9));
        assert!(product.tags.is_empty());
        assert!(!product.featured);
    }

    #[tokio::test]
    async fn test_builtin_catalog_is_served_and_cached() {
        let backend = BackendClient::new(&crate::config::BackendConfig {
            url: url::Url::parse("http://127.0.0.1:9").unwrap(),
            anon_key: secrecy::SecretString::from("k"),
            service_key: None,
        })
        .unwrap();
        let catalog = Catalog::new(&CatalogConfig::default(), backend);

        let first = catalog.products().await;
        let second = catalog.products().await;
        assert!(!first.is_empty());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(catalog.get(first[0].id).await.is_some());
        assert!(catalog.get(ProductId::new(-1)).await.is_none());
    }

    #[tokio::test]
    async fn test_backend_failure_is_not_cached() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = Router::new().route(
            "/rest/v1/products",
            get(move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    return (StatusCode::INTERNAL_SERVER_ERROR, "unavailable").into_response();
                }
                Json(serde_json::json!([{
                    "id": 500,
                    "name": "Teclado Mecânico",
                    "slug": "teclado-mecanico",
                    "description": "Switch marrom",
                    "price": "349.90",
                    "brand": "Redragon",
                    "category": "Periféricos",
                    "rating": 4.7,
                    "review_count": 88,
                    "stock": 12
                }]))
                .into_response()
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let backend = BackendClient::new(&crate::config::BackendConfig {
            url: url::Url::parse(&format!("http://{addr}")).unwrap(),
            anon_key: secrecy::SecretString::from("k"),
            service_key: None,
        })
        .unwrap();
        let config = CatalogConfig {
            source: CatalogSource::Backend,
            cache_ttl: std::time::Duration::from_secs(300),
        };
        let catalog = Catalog::new(&config, backend);

        let first = catalog.products().await;
        assert_eq!(*first, builtin_products());

        let second = catalog.products().await;
        assert_eq!(second.len(), 1);
        assert!(catalog.get(ProductId::new(500)).await.is_some());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
