//! Read side: class listings and per-client booking lookup.
//!
//! Availability is computed from a live count at read time.

use crate::errors::BookingError;
use crate::models::{
    is_valid_email, normalize_email, BookingRecord, BookingResponse, ClassListingResponse,
};
use crate::repositories::BookingStore;
use crate::services::timezone::{format_in_timezone, format_utc};
use chrono_tz::Tz;
use tracing::instrument;

/// Render an admitted booking with the class start in `tz`.
pub fn booking_response(record: &BookingRecord, tz: Tz) -> BookingResponse {
    BookingResponse {
        id: record.booking.booking_id,
        class_id: record.booking.class_id,
        client_name: record.booking.client_name.clone(),
        client_email: record.booking.client_email.clone(),
        created_at: format_utc(record.booking.booked_at),
        class_name: record.class_name.clone(),
        instructor: record.instructor.clone(),
        start_time: format_in_timezone(record.start_time, tz),
        timezone: tz.name().to_string(),
    }
}

/// All classes ordered by start time with remaining slots.
#[instrument(skip_all, name = "booking.service.list_classes", fields(tz = %tz.name()))]
pub async fn list_classes(
    store: &dyn BookingStore,
    tz: Tz,
) -> Result<Vec<ClassListingResponse>, BookingError> {
    let classes = store.list_classes_with_availability().await?;

    Ok(classes
        .iter()
        .map(|entry| ClassListingResponse {
            id: entry.class.class_id,
            name: entry.class.name.clone(),
            instructor: entry.class.instructor.clone(),
            start_time: format_in_timezone(entry.class.start_time, tz),
            timezone: tz.name().to_string(),
            capacity: entry.class.capacity,
            available_slots: entry.available_slots(),
        })
        .collect())
}

/// Every booking held by `email`, ordered by class start time.
///
/// A malformed email holds no bookings and yields an empty list without a
/// store round trip.
///
/// # Errors
///
/// Returns `BookingError::ServiceUnavailable` when the store fails.
#[instrument(skip_all, name = "booking.service.list_bookings", fields(tz = %tz.name()))]
pub async fn list_bookings(
    store: &dyn BookingStore,
    email: &str,
    tz: Tz,
) -> Result<Vec<BookingResponse>, BookingError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Ok(Vec::new());
    }

    let bookings = store.list_bookings_for_email(&email).await?;

    Ok(bookings
        .into_iter()
        .map(|entry| {
            let record = BookingRecord {
                booking: entry.booking,
                class_name: entry.class.name,
                instructor: entry.class.instructor,
                start_time: entry.class.start_time,
            };
            booking_response(&record, tz)
        })
        .collect())
}
