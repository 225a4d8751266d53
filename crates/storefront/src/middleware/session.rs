//! Session middleware configuration.
//!
//! Sessions hold the signed-in customer, the cart and the guest wishlist.
//! They live in an in-process `moka` store that drops records once their
//! expiry passes and caps how many are kept. A restart signs customers out
//! and empties guest carts, which the backend-held data (orders, customer
//! wishlists, notifications) survives.

use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_moka_store::MokaStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ecomify_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Most sessions held at once; the least recently used go first.
const MAX_SESSIONS: u64 = 100_000;

/// In-memory store that evicts expired records.
#[must_use]
pub fn session_store() -> MokaStore {
    MokaStore::new(Some(MAX_SESSIONS))
}

/// Create the session layer.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MokaStore> {
    SessionManagerLayer::new(session_store())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tower_sessions::SessionStore;
    use tower_sessions::cookie::time::{self, OffsetDateTime};
    use tower_sessions::session::{Id, Record};

    #[tokio::test]
    async fn test_expired_sessions_are_evicted() {
        let store = session_store();
        let mut record = Record {
            id: Id::default(),
            data: [("cart".to_string(), serde_json::json!([]))].into(),
            expiry_date: OffsetDateTime::now_utc() + time::Duration::milliseconds(500),
        };
        store.create(&mut record).await.unwrap();

        let loaded = store.load(&record.id).await.unwrap();
        assert_eq!(loaded.map(|r| r.data), Some(record.data.clone()));

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert!(store.load(&record.id).await.unwrap().is_none());
    }
}
