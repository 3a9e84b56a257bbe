use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{validate_max_results, validate_sort_order};
use super::{ApiError, AppState, ExportResponse};
use crate::models::business::clamp_max_results;
use crate::services::ExportScope;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub term: Option<String>,
    pub location: Option<String>,
    pub sort_by: Option<String>,
    pub max_results: Option<u32>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// `GET /api/export`
///
/// Writes the cached businesses for (term, location, sort order) to a CSV
/// file. Without term and location every cached business is exported.
pub async fn export_businesses(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Json<ExportResponse>, ApiError> {
    let Query(query) = query?;
    let scope = match (
        non_blank(query.term.as_deref()),
        non_blank(query.location.as_deref()),
    ) {
        (Some(term), Some(location)) => ExportScope::Query {
            term,
            location,
            sort_by: validate_sort_order(query.sort_by.as_deref())?,
        },
        (None, None) => ExportScope::All,
        _ => {
            return Err(ApiError::validation(
                "term and location must be given together",
            ));
        }
    };

    let max_results = query
        .max_results
        .map(validate_max_results)
        .transpose()?
        .map(clamp_max_results);

    let path = state.export_service().export(&scope, max_results).await?;

    Ok(Json(ExportResponse {
        message: "CSV export successful".to_string(),
        file: path.display().to_string(),
    }))
}
