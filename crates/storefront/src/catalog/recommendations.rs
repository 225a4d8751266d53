//! "Você também pode gostar" recommendations.
//!
//! There is no model behind this: candidates are products sharing the seed
//! product's category or brand (featured products when there are none), and
//! each gets a random confidence in `[0.70, 0.99)`. The configured delay
//! stands in for inference latency.

use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::instrument;

use super::Product;

/// Default number of recommendations per product.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 4;

const MIN_CONFIDENCE: f64 = 0.70;
const MAX_CONFIDENCE: f64 = 0.99;

/// Why a product was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    SameCategory,
    SameBrand,
    Featured,
}

impl Reason {
    /// Customer-facing explanation.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::SameCategory => "Clientes que viram este produto também compraram",
            Self::SameBrand => "Da mesma marca que você está vendo",
            Self::Featured => "Em destaque na Ecomify",
        }
    }
}

/// A recommended product.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub product: Product,
    pub confidence: f64,
    pub reason: String,
}

/// In-stock products related to `seed`, excluding `seed` itself.
#[must_use]
pub fn candidates<'a>(products: &'a [Product], seed: &Product) -> Vec<(&'a Product, Reason)> {
    let others = || {
        products
            .iter()
            .filter(move |p| p.id != seed.id && p.in_stock())
    };

    let related: Vec<_> = others()
        .filter_map(|p| {
            if p.category == seed.category {
                Some((p, Reason::SameCategory))
            } else if p.brand == seed.brand {
                Some((p, Reason::SameBrand))
            } else {
                None
            }
        })
        .collect();

    if !related.is_empty() {
        return related;
    }

    others()
        .filter(|p| p.featured)
        .map(|p| (p, Reason::Featured))
        .collect()
}

/// Assign confidences from `rng`, best first, keeping at most `limit`.
pub fn score_with<R: Rng + ?Sized>(
    candidates: Vec<(&Product, Reason)>,
    rng: &mut R,
    limit: usize,
) -> Vec<Recommendation> {
    let mut scored: Vec<Recommendation> = candidates
        .into_iter()
        .map(|(product, reason)| Recommendation {
            product: product.clone(),
            confidence: rng.random_range(MIN_CONFIDENCE..MAX_CONFIDENCE),
            reason: reason.message().to_string(),
        })
        .collect();

    scored.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    scored.truncate(limit);
    scored
}

/// Recommendations for `seed` after the simulated inference delay.
#[instrument(skip(products, seed), fields(product_id = %seed.id))]
pub async fn recommend(
    products: &[Product],
    seed: &Product,
    limit: usize,
    delay: Duration,
) -> Vec<Recommendation> {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let picked = candidates(products, seed);
    let recommendations = score_with(picked, &mut rand::rng(), limit);
    tracing::debug!(count = recommendations.len(), "Recommendations generated");
    recommendations
}
