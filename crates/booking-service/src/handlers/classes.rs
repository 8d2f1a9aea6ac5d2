//! Class listing handler.

use crate::errors::BookingError;
use crate::models::{ClassListingResponse, ClassesQuery};
use crate::routes::AppState;
use crate::services::catalog;
use crate::services::timezone::resolve_timezone;
use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for `GET /classes?tz=`.
///
/// Unknown or missing `tz` falls back to the configured default timezone.
#[instrument(skip_all, name = "booking.handler.list_classes")]
pub async fn list_classes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClassesQuery>,
) -> Result<Json<Vec<ClassListingResponse>>, BookingError> {
    let tz = resolve_timezone(query.tz.as_deref(), state.config.default_timezone);
    let classes = catalog::list_classes(state.store.as_ref(), tz).await?;
    Ok(Json(classes))
}
