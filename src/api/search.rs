use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::validation::{
    validate_max_results, validate_page_size, validate_required, validate_sort_order,
};
use super::{ApiError, AppState, SearchResponse};
use crate::models::SearchParams;

const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_MAX_RESULTS: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub term: Option<String>,
    pub location: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<u32>,
    pub max_results: Option<u32>,
}

/// `GET /api/search`
///
/// Serves from the cache when this exact query was fetched before.
pub async fn search_businesses(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(query) = query?;
    let term = validate_required("term", query.term.as_deref())?;
    let location = validate_required("location", query.location.as_deref())?;
    let sort_by = validate_sort_order(query.sort_by.as_deref())?;
    let limit = validate_page_size(query.limit.unwrap_or(DEFAULT_PAGE_SIZE))?;
    let max_results = validate_max_results(query.max_results.unwrap_or(DEFAULT_MAX_RESULTS))?;

    let params = SearchParams::new(term, location, sort_by, limit, max_results);
    info!(
        term = %params.term,
        location = %params.location,
        sort_by = %params.sort_by,
        limit = params.limit,
        max_results = params.max_results,
        "Searching businesses"
    );

    let businesses = state.search_service().resolve(&params).await?;

    if businesses.is_empty() {
        return Err(ApiError::not_found("No businesses found"));
    }

    Ok(Json(SearchResponse { businesses }))
}
