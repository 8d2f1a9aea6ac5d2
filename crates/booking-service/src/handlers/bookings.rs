//! Booking handlers.
//!
//! - `POST /book` - admit a booking through the admission controller
//! - `GET /bookings?email=&tz=` - bookings held by one email
//!
//! Malformed JSON or query strings are reported with the same JSON error
//! body as domain errors.

use crate::errors::{AdmissionError, BookingError};
use crate::models::{BookRequest, BookingResponse, BookingsQuery};
use crate::observability::metrics;
use crate::routes::AppState;
use crate::services::catalog;
use crate::services::timezone::resolve_timezone;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Handler for `POST /book`.
///
/// Returns 201 with the booking (class start in UTC), or
/// 400 / 404 / 409 / 503 with a JSON error body.
#[instrument(skip_all, name = "booking.handler.book_class")]
pub async fn book_class(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingResponse>), BookingError> {
    let Json(request) = payload.map_err(|e| invalid_request(e.body_text()))?;

    request
        .validate()
        .map_err(|reason| invalid_request(reason.to_string()))?;

    let record = state
        .admission
        .attempt_booking(
            request.class_id,
            &request.client_name,
            &request.client_email,
        )
        .await
        .map_err(|e: AdmissionError| {
            let err = BookingError::from(e);
            metrics::record_error(error_type(&err), err.status_code());
            err
        })?;

    Ok((
        StatusCode::CREATED,
        Json(catalog::booking_response(&record, chrono_tz::UTC)),
    ))
}

/// Handler for `GET /bookings?email=&tz=`.
#[instrument(skip_all, name = "booking.handler.list_bookings")]
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BookingsQuery>, QueryRejection>,
) -> Result<Json<Vec<BookingResponse>>, BookingError> {
    let Query(query) = query.map_err(|e| BookingError::BadRequest(e.body_text()))?;

    let tz = resolve_timezone(query.tz.as_deref(), state.config.default_timezone);
    let bookings = catalog::list_bookings(state.store.as_ref(), &query.email, tz).await?;

    Ok(Json(bookings))
}

/// Count a malformed request and turn it into a 400.
pub(crate) fn invalid_request(reason: String) -> BookingError {
    metrics::record_error("invalid_request", 400);
    BookingError::BadRequest(reason)
}

fn error_type(err: &BookingError) -> &'static str {
    match err {
        BookingError::BadRequest(_) => "invalid_request",
        BookingError::ClassNotFound => "class_not_found",
        BookingError::CapacityExceeded => "capacity_exceeded",
        BookingError::DuplicateBooking => "duplicate_booking",
        BookingError::ServiceUnavailable(_) => "storage_unavailable",
        BookingError::Conflict(_) => "conflict",
        BookingError::Database(_) | BookingError::Internal => "internal",
    }
}
