//! Catalog search, autocomplete and ranking.
//!
//! Everything here is a pure function over a product slice; the catalog is
//! small enough that a linear scan per request is the whole index.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecomify_core::ProductId;

use super::Product;

/// Default number of autocomplete suggestions.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 6;

/// Queries shorter than this produce no suggestions.
const MIN_SUGGEST_CHARS: usize = 2;

const NAME_WEIGHT: f64 = 3.0;
const NAME_PREFIX_BONUS: f64 = 1.0;
const BRAND_WEIGHT: f64 = 2.0;
const DESCRIPTION_WEIGHT: f64 = 1.0;
const TAG_BONUS: f64 = 0.5;
const FEATURED_BONUS: f64 = 0.5;
const HIGH_RATING_BONUS: f64 = 0.3;
const HIGH_RATING: f64 = 4.5;

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Rating,
    Newest,
    BestSelling,
}

impl SearchSort {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Rating => "rating",
            Self::Newest => "newest",
            Self::BestSelling => "best_selling",
        }
    }
}

impl fmt::Display for SearchSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(Self::Relevance),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "rating" => Ok(Self::Rating),
            "newest" => Ok(Self::Newest),
            "best_selling" => Ok(Self::BestSelling),
            other => Err(format!("unknown sort: {other}")),
        }
    }
}

/// Search parameters, deserialized straight from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default, rename = "q")]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default, rename = "in_stock")]
    pub in_stock_only: bool,
    #[serde(default)]
    pub sort: SearchSort,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    /// Free-text query.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    /// The trimmed, lowercased needle, or `None` for an empty query.
    fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    fn admits(&self, product: &Product) -> bool {
        if let Some(category) = non_blank(self.category.as_deref())
            && product.category.to_lowercase() != category.to_lowercase()
        {
            return false;
        }
        if let Some(brand) = non_blank(self.brand.as_deref())
            && product.brand.to_lowercase() != brand.to_lowercase()
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        !self.in_stock_only || product.in_stock()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A matching product with its relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub product: Product,
    pub score: f64,
}

/// Filter and rank `products`.
///
/// A non-empty query admits only products whose name, brand or description
/// contains it (case-insensitive). Tags raise the score of admitted products
/// but never admit one on their own.
#[must_use]
pub fn search(products: &[Product], query: &SearchQuery) -> Vec<SearchHit> {
    let needle = query.needle();

    let mut hits: Vec<SearchHit> = products
        .iter()
        .filter(|p| query.admits(p))
        .filter_map(|p| {
            let score = match needle.as_deref() {
                Some(needle) => text_score(p, needle)?,
                None => 0.0,
            };
            Some(SearchHit {
                product: p.clone(),
                score: score + boost(p),
            })
        })
        .collect();

    hits.sort_by(|a, b| compare(query.sort, a, b));

    if let Some(limit) = query.limit {
        hits.truncate(limit);
    }
    hits
}

/// Weighted text match, or `None` if the product does not match at all.
fn text_score(product: &Product, needle: &str) -> Option<f64> {
    let name = product.name.to_lowercase();
    let mut score = 0.0;
    let mut matched = false;

    if name.contains(needle) {
        matched = true;
        score += NAME_WEIGHT;
        if name.starts_with(needle) {
            score += NAME_PREFIX_BONUS;
        }
    }
    if product.brand.to_lowercase().contains(needle) {
        matched = true;
        score += BRAND_WEIGHT;
    }
    if product.description.to_lowercase().contains(needle) {
        matched = true;
        score += DESCRIPTION_WEIGHT;
    }
    if !matched {
        return None;
    }

    if product
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(needle))
    {
        score += TAG_BONUS;
    }
    Some(score)
}

/// Constant relevance bonus for featured and highly rated products.
fn boost(product: &Product) -> f64 {
    let mut bonus = 0.0;
    if product.featured {
        bonus += FEATURED_BONUS;
    }
    if product.rating >= HIGH_RATING {
        bonus += HIGH_RATING_BONUS;
    }
    bonus
}

fn compare(sort: SearchSort, a: &SearchHit, b: &SearchHit) -> Ordering {
    let (pa, pb) = (&a.product, &b.product);
    let primary = match sort {
        SearchSort::Relevance => b
            .score
            .total_cmp(&a.score)
            .then_with(|| pb.popularity().total_cmp(&pa.popularity())),
        SearchSort::PriceAsc => pa.price.cmp(&pb.price),
        SearchSort::PriceDesc => pb.price.cmp(&pa.price),
        SearchSort::Rating => pb
            .rating
            .total_cmp(&pa.rating)
            .then_with(|| pb.review_count.cmp(&pa.review_count)),
        SearchSort::Newest => pb.id.cmp(&pa.id),
        SearchSort::BestSelling => pb.popularity().total_cmp(&pa.popularity()),
    };
    primary.then_with(|| pa.id.cmp(&pb.id))
}

// =============================================================================
// Autocomplete
// =============================================================================

/// What a suggestion refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Product,
    Brand,
    Category,
}

/// One autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
}

/// Autocomplete: product names, then brands, then categories containing
/// `query`, deduplicated case-insensitively and capped at `limit`.
#[must_use]
pub fn suggest(products: &[Product], query: &str, limit: usize) -> Vec<Suggestion> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < MIN_SUGGEST_CHARS {
        return Vec::new();
    }

    let mut names: Vec<&Product> = products
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect();
    // Prefix matches first, then the more popular product.
    names.sort_by(|a, b| {
        let a_prefix = a.name.to_lowercase().starts_with(&needle);
        let b_prefix = b.name.to_lowercase().starts_with(&needle);
        b_prefix
            .cmp(&a_prefix)
            .then_with(|| b.popularity().total_cmp(&a.popularity()))
    });

    let candidates = names
        .into_iter()
        .map(|p| (p.name.as_str(), SuggestionKind::Product, Some(p.id)))
        .chain(
            products
                .iter()
                .filter(|p| p.brand.to_lowercase().contains(&needle))
                .map(|p| (p.brand.as_str(), SuggestionKind::Brand, None)),
        )
        .chain(
            products
                .iter()
                .filter(|p| p.category.to_lowercase().contains(&needle))
                .map(|p| (p.category.as_str(), SuggestionKind::Category, None)),
        );

    let mut seen = HashSet::new();
    candidates
        .filter(|(text, _, _)| seen.insert(text.to_lowercase()))
        .take(limit)
        .map(|(text, kind, product_id)| Suggestion {
            text: text.to_string(),
            kind,
            product_id,
        })
        .collect()
}

// =============================================================================
// Listings
// =============================================================================

/// Most popular products (`review_count × rating`), best first.
#[must_use]
pub fn best_sellers(products: &[Product], limit: usize) -> Vec<Product> {
    let mut ranked: Vec<&Product> = products.iter().collect();
    ranked.sort_by(|a, b| {
        b.popularity()
            .total_cmp(&a.popularity())
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.into_iter().take(limit).cloned().collect()
}

/// A category with the number of products in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub product_count: usize,
}

/// Distinct categories, alphabetically.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<CategorySummary> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for product in products {
        *counts.entry(product.category.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, product_count)| CategorySummary {
            name: name.to_string(),
            product_count,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::catalog::builtin_products;

    fn contains_ci(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }

    #[test]
    fn test_results_are_subset_and_contain_query() {
        let catalog = builtin_products();
        for text in ["apple", "SAMSUNG", "fone", "sem fio", "Gamer", "tela", "xyz"] {
            let hits = search(&catalog, &SearchQuery::text(text));
            for hit in &hits {
                assert!(catalog.contains(&hit.product), "{text}: not in catalog");
                let p = &hit.product;
                assert!(
                    contains_ci(&p.name, text)
                        || contains_ci(&p.brand, text)
                        || contains_ci(&p.description, text),
                    "{text}: {} does not contain the query",
                    p.name
                );
            }
        }
    }

    #[test]
    fn test_tag_only_match_is_excluded() {
        // "custo-benefício" is only a tag of the Redmi Note 13.
        let hits = search(&builtin_products(), &SearchQuery::text("custo-benefício"));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let catalog = builtin_products();
        let hits = search(&catalog, &SearchQuery::text("   "));
        assert_eq!(hits.len(), catalog.len());
    }

    #[test]
    fn test_name_match_outranks_description_match() {
        let catalog = builtin_products();
        let hits = search(&catalog, &SearchQuery::text("notebook"));
        assert!(!hits.is_empty());
        // Names starting with "Notebook" score highest.
        assert!(hits[0].product.name.starts_with("Notebook"));
        let last = hits.last().unwrap();
        assert!(!contains_ci(&last.product.name, "notebook"));
    }

    #[test]
    fn test_featured_and_rating_bonus() {
        let catalog = builtin_products();
        let hits = search(&catalog, &SearchQuery::default());
        let playstation = hits.iter().find(|h| h.product.id == ProductId::new(13)).unwrap();
        // featured + rating 4.9
        assert!((playstation.score - 0.8).abs() < 1e-9);
        let dell = hits.iter().find(|h| h.product.id == ProductId::new(5)).unwrap();
        assert!(dell.score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_filters() {
        let catalog = builtin_products();
        let query = SearchQuery {
            category: Some("notebooks".to_string()),
            in_stock_only: true,
            max_price: Some(dec!(6000)),
            ..SearchQuery::default()
        };
        let hits = search(&catalog, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.brand, "Dell");

        let query = SearchQuery {
            brand: Some("JBL".to_string()),
            min_price: Some(dec!(300)),
            ..SearchQuery::default()
        };
        let hits = search(&catalog, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].product.id, ProductId::new(9));
    }

    #[test]
    fn test_sort_orders() {
        let catalog = builtin_products();
        let by = |sort| {
            search(
                &catalog,
                &SearchQuery {
                    sort,
                    ..SearchQuery::default()
                },
            )
        };

        let asc = by(SearchSort::PriceAsc);
        assert!(asc.windows(2).all(|w| w[0].product.price <= w[1].product.price));
        let desc = by(SearchSort::PriceDesc);
        assert!(desc.windows(2).all(|w| w[0].product.price >= w[1].product.price));
        let newest = by(SearchSort::Newest);
        assert!(newest.windows(2).all(|w| w[0].product.id > w[1].product.id));
        let rating = by(SearchSort::Rating);
        assert!(rating.windows(2).all(|w| w[0].product.rating >= w[1].product.rating));
    }

    #[test]
    fn test_limit() {
        let query = SearchQuery {
            limit: Some(3),
            ..SearchQuery::default()
        };
        assert_eq!(search(&builtin_products(), &query).len(), 3);
    }

    #[test]
    fn test_sort_parse() {
        for sort in [
            SearchSort::Relevance,
            SearchSort::PriceAsc,
            SearchSort::PriceDesc,
            SearchSort::Rating,
            SearchSort::Newest,
            SearchSort::BestSelling,
        ] {
            assert_eq!(sort.as_str().parse::<SearchSort>().unwrap(), sort);
        }
        assert!("cheapest".parse::<SearchSort>().is_err());
    }

    #[test]
    fn test_suggest_orders_names_brands_categories() {
        let catalog = builtin_products();
        let suggestions = suggest(&catalog, "sam", DEFAULT_SUGGESTION_LIMIT);
        assert!(!suggestions.is_empty());
        assert!(suggestions.len() <= DEFAULT_SUGGESTION_LIMIT);
        assert_eq!(suggestions[0].kind, SuggestionKind::Product);
        let brand_pos = suggestions
            .iter()
            .position(|s| s.kind == SuggestionKind::Brand)
            .unwrap();
        assert!(suggestions[..brand_pos]
            .iter()
            .all(|s| s.kind == SuggestionKind::Product));
        assert_eq!(
            suggestions
                .iter()
                .filter(|s| s.text == "Samsung")
                .count(),
            1
        );
    }

    #[test]
    fn test_suggest_category_and_short_query() {
        let catalog = builtin_products();
        let suggestions = suggest(&catalog, "tablets", DEFAULT_SUGGESTION_LIMIT);
        assert_eq!(
            suggestions,
            vec![Suggestion {
                text: "Tablets".to_string(),
                kind: SuggestionKind::Category,
                product_id: None,
            }]
        );
        assert!(suggest(&catalog, "a", DEFAULT_SUGGESTION_LIMIT).is_empty());
    }

    #[test]
    fn test_best_sellers() {
        let catalog = builtin_products();
        let top = best_sellers(&catalog, 3);
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].popularity() >= w[1].popularity()));
        // Logitech G502: 4210 reviews at 4.7
        assert_eq!(top[0].id, ProductId::new(14));
    }

    #[test]
    fn test_categories() {
        let summaries = categories(&builtin_products());
        let notebooks = summaries.iter().find(|c| c.name == "Notebooks").unwrap();
        assert_eq!(notebooks.product_count, 3);
        let total: usize = summaries.iter().map(|c| c.product_count).sum();
        assert_eq!(total, builtin_products().len());
    }
}
