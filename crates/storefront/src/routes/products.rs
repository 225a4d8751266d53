//! Product route handlers.
//!
//! Listing, detail, simulated recommendations, reviews, categories and
//! best-sellers. Everything except review creation is public and served
//! from the cached catalog.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderValue, header::CACHE_CONTROL},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ecomify_core::ProductId;

use crate::catalog::Product;
use crate::catalog::recommendations::{self, DEFAULT_RECOMMENDATION_LIMIT, Recommendation};
use crate::catalog::search::{self, CategorySummary, SearchHit, SearchQuery};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::reviews::{CreateReview, Review, Reviews};
use crate::state::AppState;

/// Default size of the best-seller list.
const DEFAULT_BEST_SELLER_LIMIT: usize = 8;

/// Largest page any list endpoint returns.
const MAX_LIMIT: usize = 100;

/// Catalog responses may be cached briefly by browsers.
const CATALOG_CACHE_CONTROL: &str = "public, max-age=60";

/// Query string for endpoints that only take a limit.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// Search results with the count before the limit was applied.
#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub total: usize,
    pub results: Vec<SearchHit>,
}

/// Product detail.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub display_price: String,
    pub discount_percentage: Option<u32>,
    pub in_stock: bool,
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        Self {
            display_price: product.display_price(),
            discount_percentage: product.discount_percentage(),
            in_stock: product.in_stock(),
            product,
        }
    }
}

/// Run a catalog search, reporting the total before truncation.
pub(crate) async fn run_search(state: &AppState, mut query: SearchQuery) -> SearchResults {
    let limit = query.limit.take().map(|l| l.min(MAX_LIMIT));
    let products = state.catalog().products().await;

    let mut results = search::search(&products, &query);
    let total = results.len();
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    SearchResults { total, results }
}

/// Wrap a catalog payload with the cache header.
fn cacheable(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response.headers_mut().insert(
        CACHE_CONTROL,
        HeaderValue::from_static(CATALOG_CACHE_CONTROL),
    );
    response
}

async fn find_product(state: &AppState, id: ProductId) -> Result<Product> {
    state
        .catalog()
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))
}

/// List products, with the same filters and sorts as search.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    cacheable(Json(run_search(&state, query).await))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<Response> {
    let product = find_product(&state, id).await?;
    Ok(cacheable(Json(ProductDetail::from(product))))
}

/// Simulated AI recommendations for a product.
#[instrument(skip(state))]
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Recommendation>>> {
    let seed = find_product(&state, id).await?;
    let products = state.catalog().products().await;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
        .min(MAX_LIMIT);

    Ok(Json(
        recommendations::recommend(
            &products,
            &seed,
            limit,
            state.config().recommendation_delay,
        )
        .await,
    ))
}

/// Reviews of a product, newest first.
#[instrument(skip(state))]
pub async fn reviews(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Review>>> {
    find_product(&state, id).await?;
    Ok(Json(Reviews::new(state.backend()).for_product(id).await?))
}

/// Publish a review.
#[instrument(skip(state, customer, body), fields(user_id = %customer.id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<ProductId>,
    Json(body): Json<CreateReview>,
) -> Result<Json<Review>> {
    find_product(&state, id).await?;
    let review = Reviews::new(state.backend())
        .create(&customer, id, &body)
        .await?;
    Ok(Json(review))
}

/// Categories with product counts.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Response {
    let products = state.catalog().products().await;
    let categories: Vec<CategorySummary> = search::categories(&products);
    cacheable(Json(categories))
}

/// Best-selling products.
#[instrument(skip(state))]
pub async fn best_sellers(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let products = state.catalog().products().await;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_BEST_SELLER_LIMIT)
        .min(MAX_LIMIT);
    cacheable(Json(search::best_sellers(&products, limit)))
}
