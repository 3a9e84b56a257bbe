//! Service-level endpoints: welcome, health and cache maintenance.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use super::{ApiError, ApiResponse, AppState, HealthResponse, MessageResponse};

/// `GET /api`
pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new(
        "Welcome to the findit business search API",
    ))
}

/// `GET /api/health`
///
/// Reports 503 when the store does not answer.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let database = state.store().ping().await.is_ok();

    let body = HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ApiResponse::success(body))).into_response()
}

/// `DELETE /api/cache`
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .store()
        .clear_all()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    info!("Cache cleared via API");
    Ok(Json(MessageResponse::new("Cache cleared")))
}

/// Fallback for unknown `/api/*` paths.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
