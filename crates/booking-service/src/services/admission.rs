//! Booking admission controller.
//!
//! Decides whether a reservation request becomes a booking. The flow runs in
//! one unit of work:
//! 1. Look up the class (locking it). Absent -> `ClassNotFound`
//! 2. Count its bookings. Full -> `CapacityExceeded`
//! 3. Look for an existing booking by the same email -> `DuplicateBooking`
//! 4. Insert the booking and commit
//!
//! Capacity is checked before duplicates, so a full class always reports
//! `CapacityExceeded`. Unique or capacity violations raised by the store at
//! insert or commit time map to the same domain errors, which keeps the
//! result correct even if two requests slip past steps 2 and 3 together.
//!
//! After commit a confirmation is sent from a detached task. Its outcome
//! never reaches the caller.

use crate::errors::AdmissionError;
use crate::models::{
    is_valid_email, normalize_email, BookingRecord, NewBooking, MAX_CLIENT_NAME_LENGTH,
};
use crate::observability::metrics;
use crate::repositories::BookingStore;
use crate::services::notifier::{Notification, Notifier};
use chrono::Utc;
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Settings for the confirmation message.
#[derive(Debug, Clone)]
pub struct AdmissionSettings {
    /// Timezone the class start is rendered in.
    pub notification_timezone: Tz,

    /// Studio name in the signature.
    pub studio_name: String,
}

/// Admits bookings against a [`BookingStore`].
#[derive(Clone)]
pub struct AdmissionController {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    settings: AdmissionSettings,
}

impl AdmissionController {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        settings: AdmissionSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            settings,
        }
    }

    /// Attempt to book one slot in `class_id` for the requester.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` - blank or over-long name, malformed email
    /// - `ClassNotFound` - no such class
    /// - `CapacityExceeded` - class is full
    /// - `DuplicateBooking` - this email already holds a slot in the class
    /// - `StorageUnavailable` - the store failed; safe to retry
    #[instrument(skip_all, name = "booking.admission", fields(class_id = class_id))]
    pub async fn attempt_booking(
        &self,
        class_id: i64,
        requester_name: &str,
        requester_email: &str,
    ) -> Result<BookingRecord, AdmissionError> {
        let start = Instant::now();

        let result = self.admit(class_id, requester_name, requester_email).await;

        let outcome = match &result {
            Ok(_) => "admitted",
            Err(e) => e.outcome(),
        };
        metrics::record_admission(outcome, start.elapsed());

        match &result {
            Ok(record) => {
                tracing::info!(
                    target: "booking.service.admission",
                    class_id = class_id,
                    booking_id = record.booking.booking_id,
                    "Booking admitted"
                );
                self.dispatch_confirmation(record);
            }
            Err(AdmissionError::StorageUnavailable(reason)) => {
                tracing::warn!(
                    target: "booking.service.admission",
                    class_id = class_id,
                    reason = %reason,
                    "Admission failed, store unavailable"
                );
            }
            Err(e) => {
                tracing::debug!(
                    target: "booking.service.admission",
                    class_id = class_id,
                    outcome = e.outcome(),
                    "Booking rejected"
                );
            }
        }

        result
    }

    async fn admit(
        &self,
        class_id: i64,
        requester_name: &str,
        requester_email: &str,
    ) -> Result<BookingRecord, AdmissionError> {
        let client_name = requester_name.trim();
        if client_name.is_empty() {
            return Err(AdmissionError::InvalidRequest(
                "client_name cannot be empty".to_string(),
            ));
        }
        if client_name.chars().count() > MAX_CLIENT_NAME_LENGTH {
            return Err(AdmissionError::InvalidRequest(format!(
                "client_name must be at most {} characters",
                MAX_CLIENT_NAME_LENGTH
            )));
        }

        let client_email = normalize_email(requester_email);
        if !is_valid_email(&client_email) {
            return Err(AdmissionError::InvalidRequest(
                "client_email must be a valid email address".to_string(),
            ));
        }

        // Dropping `uow` on any early return rolls it back.
        let mut uow = self.store.begin().await?;

        let class = uow
            .get_class(class_id)
            .await?
            .ok_or(AdmissionError::ClassNotFound)?;

        let booked_count = uow.count_bookings(class_id).await?;
        if booked_count >= i64::from(class.capacity) {
            return Err(AdmissionError::CapacityExceeded);
        }

        if uow.find_booking(class_id, &client_email).await?.is_some() {
            return Err(AdmissionError::DuplicateBooking);
        }

        let booking = uow
            .insert_booking(&NewBooking {
                class_id,
                client_name: client_name.to_string(),
                client_email,
                booked_at: Utc::now(),
            })
            .await?;

        uow.commit().await?;

        Ok(BookingRecord {
            booking,
            class_name: class.name,
            instructor: class.instructor,
            start_time: class.start_time,
        })
    }

    /// Send the confirmation on a detached task.
    fn dispatch_confirmation(&self, record: &BookingRecord) {
        let notification = Notification::booking_confirmation(
            record,
            self.settings.notification_timezone,
            &self.settings.studio_name,
        );
        let notifier = Arc::clone(&self.notifier);
        let booking_id = record.booking.booking_id;

        tokio::spawn(async move {
            match notifier.notify(&notification).await {
                Ok(()) => {
                    metrics::record_notification("sent");
                    tracing::debug!(
                        target: "booking.service.notify",
                        booking_id = booking_id,
                        "Confirmation sent"
                    );
                }
                Err(e) => {
                    metrics::record_notification("failed");
                    tracing::warn!(
                        target: "booking.service.notify",
                        booking_id = booking_id,
                        error = %e,
                        "Confirmation could not be sent"
                    );
                }
            }
        });
    }
}
