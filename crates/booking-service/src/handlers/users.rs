//! User registration handler.

use crate::errors::BookingError;
use crate::handlers::bookings::invalid_request;
use crate::models::{RegisterUserRequest, UserResponse};
use crate::routes::AppState;
use crate::services::users;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for `POST /users`.
#[instrument(skip_all, name = "booking.handler.register_user")]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), BookingError> {
    let Json(request) = payload.map_err(|e| invalid_request(e.body_text()))?;

    let user =
        users::register_user(state.store.as_ref(), request, state.config.bcrypt_cost).await?;

    Ok((StatusCode::CREATED, Json(user)))
}
