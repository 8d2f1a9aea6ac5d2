//! Repository layer for the booking service.
//!
//! The admission controller talks to storage through two traits:
//!
//! - [`BookingStore`] - pool-level reads and writes, and the entry point
//!   for opening a unit of work.
//! - [`UnitOfWork`] - the atomic scope in which admission runs. Everything
//!   done through one unit of work becomes visible together on `commit`;
//!   dropping it without committing discards it.
//!
//! Two implementations exist: [`PgBookingStore`] (PostgreSQL, row lock on the
//! class plus a unique index and capacity trigger) and
//! [`InMemoryBookingStore`] (one async mutex held for the lifetime of each
//! unit of work).

pub mod bookings;
pub mod classes;
pub mod memory;
pub mod postgres;
pub mod users;

use crate::models::{
    Booking, BookingWithClass, ClassAvailability, ClassSession, NewBooking, NewClassSession,
    NewUser, User,
};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryBookingStore;
pub use postgres::PgBookingStore;

/// Name of the unique index on `(class_id, client_email)`.
pub const BOOKING_UNIQUE_CONSTRAINT: &str = "bookings_class_email_unique";

/// Name reported by the per-class capacity trigger.
pub const BOOKING_CAPACITY_CONSTRAINT: &str = "bookings_capacity";

/// Name of the unique index on `users.email`.
pub const USER_EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_unique";

/// Store-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A write collided with a uniqueness constraint.
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// A booking write would take a class past its capacity.
    #[error("Capacity constraint violation: {0}")]
    CapacityViolation(String),

    /// Connectivity or any other storage failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    return StoreError::UniqueViolation(constraint);
                }
                sqlx::error::ErrorKind::CheckViolation
                    if constraint == BOOKING_CAPACITY_CONSTRAINT =>
                {
                    return StoreError::CapacityViolation(constraint);
                }
                _ => {}
            }
        }
        StoreError::Database(err.to_string())
    }
}

/// Record duration and status of a query and convert its error.
pub(crate) fn observe_query<T>(
    operation: &'static str,
    start: std::time::Instant,
    result: Result<T, sqlx::Error>,
) -> Result<T, StoreError> {
    let status = if result.is_ok() { "success" } else { "error" };
    crate::observability::metrics::record_db_query(operation, status, start.elapsed());
    result.map_err(StoreError::from)
}

/// Atomic unit of work used by the admission controller.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Look up a class. Implementations lock the class for the rest of the
    /// unit of work so concurrent admissions to it are serialized.
    async fn get_class(&mut self, class_id: i64) -> Result<Option<ClassSession>, StoreError>;

    /// Number of bookings currently held for a class.
    async fn count_bookings(&mut self, class_id: i64) -> Result<i64, StoreError>;

    /// Existing booking for `(class_id, email)`, if any. `email` is normalized.
    async fn find_booking(
        &mut self,
        class_id: i64,
        email: &str,
    ) -> Result<Option<Booking>, StoreError>;

    /// Insert a booking. Returns `UniqueViolation` when `(class_id, email)` is
    /// already taken and `CapacityViolation` when the class is full.
    async fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, StoreError>;

    /// Make every write of this unit of work durable.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Persistence store for classes, bookings, and users.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Open a new unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// All classes ordered by start time, each with its live booking count.
    async fn list_classes_with_availability(&self) -> Result<Vec<ClassAvailability>, StoreError>;

    /// All bookings for a normalized email, ordered by class start time.
    async fn list_bookings_for_email(
        &self,
        email: &str,
    ) -> Result<Vec<BookingWithClass>, StoreError>;

    /// Insert `classes` only if no class exists yet. Returns rows inserted.
    async fn seed_classes_if_empty(&self, classes: &[NewClassSession]) -> Result<u64, StoreError>;

    /// Insert a user. Returns `UniqueViolation` for an already registered email.
    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;

    /// Connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}
