//! Booking confirmation delivery.
//!
//! Delivery is best effort. The admission controller dispatches a
//! [`Notification`] after commit on a detached task; a failed send is logged
//! and counted, never retried, and never affects the booking.

use crate::config::SmtpConfig;
use crate::models::BookingRecord;
use crate::services::timezone::format_in_timezone;
use async_trait::async_trait;
use chrono_tz::Tz;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

/// A message addressed to one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Confirmation for an admitted booking, with the class start rendered
    /// in `tz`.
    pub fn booking_confirmation(record: &BookingRecord, tz: Tz, studio_name: &str) -> Self {
        let start = record.start_time.with_timezone(&tz);
        let body = format!(
            "Hi {name},\n\n\
             Your booking is confirmed.\n\n\
             Class: {class}\n\
             Instructor: {instructor}\n\
             Start ({abbrev}): {start}\n\n\
             See you there!\n{studio}",
            name = record.booking.client_name,
            class = record.class_name,
            instructor = record.instructor,
            abbrev = start.format("%Z"),
            start = format_in_timezone(record.start_time, tz),
            studio = studio_name,
        );

        Self {
            to: record.booking.client_email.clone(),
            subject: format!("Booking Confirmed: {}", record.class_name),
            body,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Sends notifications to clients.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Delivers over an SMTP relay using STARTTLS.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    /// Build a notifier for the relay described by `smtp`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Build` if the relay host cannot be used for TLS.
    pub fn new(smtp: &SmtpConfig, from: String) -> Result<Self, NotifyError> {
        let credentials = Credentials::new(
            smtp.username.clone(),
            smtp.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| NotifyError::Build(format!("SMTP relay error: {e}")))?
            .port(smtp.port)
            .credentials(credentials)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip_all, name = "booking.notify.smtp")]
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| NotifyError::InvalidAddress(format!("from: {e}")))?,
            )
            .to(notification
                .to
                .parse()
                .map_err(|e| NotifyError::InvalidAddress(format!("to: {e}")))?)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

/// Writes notifications to the log instead of sending them.
///
/// Used when no SMTP relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            target: "booking.notify.log",
            subject = %notification.subject,
            "SMTP not configured, confirmation written to log"
        );
        tracing::debug!(
            target: "booking.notify.log",
            body = %notification.body,
            "Confirmation body"
        );
        Ok(())
    }
}

/// Test doubles for [`Notifier`].
pub mod mock {
    use super::*;
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    /// Records every notification; optionally fails each send.
    #[derive(Default)]
    pub struct MockNotifier {
        sent: Mutex<Vec<Notification>>,
        return_error: bool,
    }

    impl MockNotifier {
        /// Create a mock that accepts every notification.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock whose sends always fail (after recording them).
        pub fn failing() -> Self {
            Self {
                sent: Mutex::default(),
                return_error: true,
            }
        }

        /// Notifications received so far.
        pub fn sent(&self) -> Vec<Notification> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Number of notifications received so far.
        pub fn call_count(&self) -> usize {
            self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
        }

        /// Wait until at least `count` notifications have arrived, or the
        /// timeout elapses. Returns whether the count was reached.
        pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                if self.call_count() >= count {
                    return true;
                }
                if tokio::time::Instant::now() >= deadline {
                    return false;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notification.clone());

            if self.return_error {
                return Err(NotifyError::Delivery("Mock notifier error".to_string()));
            }
            Ok(())
        }
    }
}
