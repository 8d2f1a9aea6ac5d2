//! Booking service error types.
//!
//! `AdmissionError` is the typed result of the admission controller.
//! `BookingError` is the API-facing error; every variant maps to a stable
//! HTTP status and machine-readable code via the `IntoResponse` impl.
//! Storage details are logged server-side and never returned to clients.

use crate::repositories::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Outcome of a rejected admission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// Requester input was rejected before touching the store.
    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),

    /// The class does not exist. Terminal.
    #[error("Class not found")]
    ClassNotFound,

    /// The class has no remaining slots. Terminal.
    #[error("No slots available for this class")]
    CapacityExceeded,

    /// The requester already holds a booking for this class. Terminal.
    #[error("Already booked this class with this email")]
    DuplicateBooking,

    /// The store could not complete the unit of work. Safe to retry.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl AdmissionError {
    /// Bounded label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            AdmissionError::InvalidRequest(_) => "invalid_request",
            AdmissionError::ClassNotFound => "class_not_found",
            AdmissionError::CapacityExceeded => "capacity_exceeded",
            AdmissionError::DuplicateBooking => "duplicate_booking",
            AdmissionError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl From<StoreError> for AdmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => AdmissionError::DuplicateBooking,
            StoreError::CapacityViolation(_) => AdmissionError::CapacityExceeded,
            StoreError::Database(msg) => AdmissionError::StorageUnavailable(msg),
        }
    }
}

/// Booking service API error type.
///
/// Maps to HTTP status codes:
/// - BadRequest: 400 Bad Request
/// - ClassNotFound: 404 Not Found
/// - CapacityExceeded, DuplicateBooking, Conflict: 409 Conflict
/// - Database, Internal: 500 Internal Server Error
/// - ServiceUnavailable: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Class not found")]
    ClassNotFound,

    #[error("No slots available for this class")]
    CapacityExceeded,

    #[error("Already booked this class with this email")]
    DuplicateBooking,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl BookingError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            BookingError::Database(_) | BookingError::Internal => 500,
            BookingError::BadRequest(_) => 400,
            BookingError::ClassNotFound => 404,
            BookingError::CapacityExceeded
            | BookingError::DuplicateBooking
            | BookingError::Conflict(_) => 409,
            BookingError::ServiceUnavailable(_) => 503,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            BookingError::Database(err) => {
                tracing::error!(target: "booking.database", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            BookingError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            BookingError::ClassNotFound => (
                StatusCode::NOT_FOUND,
                "CLASS_NOT_FOUND",
                "Class not found.".to_string(),
            ),
            BookingError::CapacityExceeded => (
                StatusCode::CONFLICT,
                "CAPACITY_EXCEEDED",
                "No slots available for this class.".to_string(),
            ),
            BookingError::DuplicateBooking => (
                StatusCode::CONFLICT,
                "DUPLICATE_BOOKING",
                "You have already booked this class with this email.".to_string(),
            ),
            BookingError::Conflict(reason) => (StatusCode::CONFLICT, "CONFLICT", reason.clone()),
            BookingError::ServiceUnavailable(reason) => {
                tracing::warn!(target: "booking.availability", reason = %reason, "Service unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            BookingError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<AdmissionError> for BookingError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::InvalidRequest(reason) => BookingError::BadRequest(reason),
            AdmissionError::ClassNotFound => BookingError::ClassNotFound,
            AdmissionError::CapacityExceeded => BookingError::CapacityExceeded,
            AdmissionError::DuplicateBooking => BookingError::DuplicateBooking,
            AdmissionError::StorageUnavailable(reason) => BookingError::ServiceUnavailable(reason),
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(reason) => BookingError::ServiceUnavailable(reason),
            other => BookingError::Database(other.to_string()),
        }
    }
}
