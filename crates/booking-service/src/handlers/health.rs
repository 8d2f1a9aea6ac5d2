//! Health check handler.

use crate::models::HealthResponse;
use crate::routes::AppState;
use crate::services::timezone::format_utc;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

/// Handler for `GET /health`.
///
/// Pings the store. Returns 200 when it answers and 503 otherwise; the
/// failure detail is logged, not returned.
#[tracing::instrument(skip_all, name = "booking.health")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let time = format_utc(Utc::now());

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                database: "healthy".to_string(),
                time,
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "booking.health", error = %e, "Health check failed: store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    database: "unhealthy".to_string(),
                    time,
                }),
            )
        }
    }
}
