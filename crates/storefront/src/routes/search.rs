//! Search and autocomplete handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::search::{self, DEFAULT_SUGGESTION_LIMIT, SearchQuery, Suggestion};
use crate::routes::products::{SearchResults, run_search};
use crate::state::AppState;

/// Upper bound for the suggestion limit.
const MAX_SUGGESTIONS: usize = 20;

/// Autocomplete query string.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Full-text search over the catalog.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SearchResults> {
    Json(run_search(&state, query).await)
}

/// Autocomplete suggestions; queries under two characters return nothing.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> Json<Vec<Suggestion>> {
    let products = state.catalog().products().await;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SUGGESTION_LIMIT)
        .min(MAX_SUGGESTIONS);
    Json(search::suggest(&products, &query.q, limit))
}
