//! Wishlist.
//!
//! Guests keep their saved product IDs in the session. Signed-in customers
//! keep them in the backend `wishlist` table under their own token; the
//! guest list is merged into it on sign-in.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use ecomify_core::{ProductId, UserId};

use crate::backend::{BackendClient, BackendError, Caller, Direction, Query};
use crate::catalog::Product;
use crate::models::{CurrentCustomer, session_keys};

const TABLE: &str = "wishlist";

/// Wishlist storage errors.
#[derive(Debug, Error)]
pub enum WishlistError {
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Serialize)]
struct NewEntry {
    user_id: UserId,
    product_id: ProductId,
}

#[derive(Debug, Deserialize)]
struct Entry {
    product_id: ProductId,
}

/// The current visitor's wishlist.
pub struct Wishlist<'a> {
    session: &'a Session,
    backend: &'a BackendClient,
    customer: Option<&'a CurrentCustomer>,
}

impl<'a> Wishlist<'a> {
    #[must_use]
    pub const fn new(
        session: &'a Session,
        backend: &'a BackendClient,
        customer: Option<&'a CurrentCustomer>,
    ) -> Self {
        Self {
            session,
            backend,
            customer,
        }
    }

    /// Saved product IDs, most recent first for customers and in insertion
    /// order for guests.
    ///
    /// # Errors
    ///
    /// Returns error if the session or backend cannot be read.
    #[instrument(skip(self))]
    pub async fn product_ids(&self) -> Result<Vec<ProductId>, WishlistError> {
        match self.customer {
            Some(customer) => {
                let query = Query::new()
                    .eq("user_id", customer.id)
                    .order("created_at", Direction::Desc);
                let entries: Vec<Entry> = self
                    .backend
                    .table(TABLE, Caller::User(&customer.access_token))
                    .select(&query)
                    .await?;
                Ok(entries.into_iter().map(|e| e.product_id).collect())
            }
            None => self.guest_ids().await,
        }
    }

    /// Whether `product_id` is saved.
    ///
    /// # Errors
    ///
    /// Returns error if the session or backend cannot be read.
    pub async fn contains(&self, product_id: ProductId) -> Result<bool, WishlistError> {
        Ok(self.product_ids().await?.contains(&product_id))
    }

    /// Save a product. Saving twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the session or backend cannot be written.
    #[instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId) -> Result<(), WishlistError> {
        match self.customer {
            Some(customer) => {
                self.backend
                    .table(TABLE, Caller::User(&customer.access_token))
                    .upsert(&[NewEntry {
                        user_id: customer.id,
                        product_id,
                    }])
                    .await?;
            }
            None => {
                let mut ids = self.guest_ids().await?;
                if !ids.contains(&product_id) {
                    ids.push(product_id);
                    self.session.insert(session_keys::WISHLIST, &ids).await?;
                }
            }
        }
        Ok(())
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns error if the session or backend cannot be written.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<(), WishlistError> {
        match self.customer {
            Some(customer) => {
                let query = Query::new()
                    .eq("user_id", customer.id)
                    .eq("product_id", product_id);
                self.backend
                    .table(TABLE, Caller::User(&customer.access_token))
                    .delete(&query)
                    .await?;
            }
            None => {
                let mut ids = self.guest_ids().await?;
                ids.retain(|id| *id != product_id);
                self.session.insert(session_keys::WISHLIST, &ids).await?;
            }
        }
        Ok(())
    }

    /// Add the product if missing, remove it otherwise. Returns whether it
    /// is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns error if the session or backend cannot be read or written.
    pub async fn toggle(&self, product_id: ProductId) -> Result<bool, WishlistError> {
        if self.contains(product_id).await? {
            self.remove(product_id).await?;
            Ok(false)
        } else {
            self.add(product_id).await?;
            Ok(true)
        }
    }

    /// Move the guest list into the customer's backend list.
    ///
    /// Returns the number of products merged. Does nothing for guests.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the upsert; the guest list is
    /// kept in that case.
    #[instrument(skip(self))]
    pub async fn merge_guest_items(&self) -> Result<usize, WishlistError> {
        let Some(customer) = self.customer else {
            return Ok(0);
        };
        let ids = self.guest_ids().await?;
        if ids.is_empty() {
            return Ok(0);
        }

        let rows: Vec<NewEntry> = ids
            .iter()
            .map(|&product_id| NewEntry {
                user_id: customer.id,
                product_id,
            })
            .collect();
        self.backend
            .table(TABLE, Caller::User(&customer.access_token))
            .upsert(&rows)
            .await?;
        self.session
            .remove::<Vec<ProductId>>(session_keys::WISHLIST)
            .await?;

        tracing::info!(count = ids.len(), "Merged guest wishlist");
        Ok(ids.len())
    }

    async fn guest_ids(&self) -> Result<Vec<ProductId>, WishlistError> {
        Ok(self
            .session
            .get::<Vec<ProductId>>(session_keys::WISHLIST)
            .await?
            .unwrap_or_default())
    }
}

/// Resolve saved IDs against the catalog, skipping products that no longer
/// exist.
#[must_use]
pub fn resolve(ids: &[ProductId], products: &[Product]) -> Vec<Product> {
    ids.iter()
        .filter_map(|id| products.iter().find(|p| p.id == *id).cloned())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::catalog::builtin_products;
    use crate::config::BackendConfig;

    fn backend() -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: url::Url::parse("http://127.0.0.1:9").unwrap(),
            anon_key: secrecy::SecretString::from("k"),
            service_key: None,
        })
        .unwrap()
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_guest_wishlist_add_toggle_remove() {
        let session = session();
        let backend = backend();
        let wishlist = Wishlist::new(&session, &backend, None);

        wishlist.add(ProductId::new(3)).await.unwrap();
        wishlist.add(ProductId::new(1)).await.unwrap();
        wishlist.add(ProductId::new(3)).await.unwrap();
        assert_eq!(
            wishlist.product_ids().await.unwrap(),
            vec![ProductId::new(3), ProductId::new(1)]
        );

        assert!(!wishlist.toggle(ProductId::new(3)).await.unwrap());
        assert!(wishlist.toggle(ProductId::new(8)).await.unwrap());
        assert!(wishlist.contains(ProductId::new(8)).await.unwrap());

        wishlist.remove(ProductId::new(1)).await.unwrap();
        assert_eq!(
            wishlist.product_ids().await.unwrap(),
            vec![ProductId::new(8)]
        );
    }

    #[tokio::test]
    async fn test_merge_is_noop_for_guests() {
        let session = session();
        let backend = backend();
        let wishlist = Wishlist::new(&session, &backend, None);
        wishlist.add(ProductId::new(2)).await.unwrap();
        assert_eq!(wishlist.merge_guest_items().await.unwrap(), 0);
        assert_eq!(wishlist.product_ids().await.unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_skips_unknown_ids() {
        let products = builtin_products();
        let resolved = resolve(
            &[ProductId::new(2), ProductId::new(404), ProductId::new(1)],
            &products,
        );
        let ids: Vec<_> = resolved.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProductId::new(2), ProductId::new(1)]);
    }
}
