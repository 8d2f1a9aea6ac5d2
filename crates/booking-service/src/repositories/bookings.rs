//! Bookings repository.
//!
//! Bookings are append-only. The `bookings_class_email_unique` index and the
//! `bookings_capacity` trigger back the admission checks at commit time.

use super::classes::map_row_to_class;
use super::{observe_query, StoreError};
use crate::models::{Booking, BookingWithClass, NewBooking};
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use std::time::Instant;
use tracing::instrument;

/// Bookings repository for database operations.
pub struct BookingsRepository;

impl BookingsRepository {
    /// Number of bookings held for a class.
    #[instrument(skip_all, name = "booking.repo.count_bookings", fields(class_id = class_id))]
    pub async fn count_for_class<'e, E>(executor: E, class_id: i64) -> Result<i64, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let start = Instant::now();

        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM bookings WHERE class_id = $1",
        )
        .bind(class_id)
        .fetch_one(executor)
        .await;

        observe_query("count_bookings", start, result)
    }

    /// Booking held by `email` (normalized) in a class, if any.
    #[instrument(skip_all, name = "booking.repo.find_booking", fields(class_id = class_id))]
    pub async fn find<'e, E>(
        executor: E,
        class_id: i64,
        email: &str,
    ) -> Result<Option<Booking>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let start = Instant::now();

        let result = sqlx::query_as::<_, Booking>(
            r#"
            SELECT booking_id, class_id, client_name, client_email, booked_at
            FROM bookings
            WHERE class_id = $1 AND client_email = $2
            "#,
        )
        .bind(class_id)
        .bind(email)
        .fetch_optional(executor)
        .await;

        observe_query("find_booking", start, result)
    }

    /// Insert a booking.
    ///
    /// Fails with `UniqueViolation` when `(class_id, client_email)` is taken
    /// and with `CapacityViolation` when the trigger finds the class full.
    #[instrument(skip_all, name = "booking.repo.insert_booking", fields(class_id = booking.class_id))]
    pub async fn insert<'e, E>(executor: E, booking: &NewBooking) -> Result<Booking, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let start = Instant::now();

        let result = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (class_id, client_name, client_email, booked_at)
            VALUES ($1, $2, $3, $4)
            RETURNING booking_id, class_id, client_name, client_email, booked_at
            "#,
        )
        .bind(booking.class_id)
        .bind(&booking.client_name)
        .bind(&booking.client_email)
        .bind(booking.booked_at)
        .fetch_one(executor)
        .await;

        observe_query("insert_booking", start, result)
    }

    /// Every booking for `email` (normalized) joined with its class, ordered
    /// by class start time.
    #[instrument(skip_all, name = "booking.repo.list_bookings_for_email")]
    pub async fn list_for_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Vec<BookingWithClass>, StoreError> {
        let start = Instant::now();

        let result = sqlx::query(
            r#"
            SELECT b.booking_id, b.class_id, b.client_name, b.client_email, b.booked_at,
                   c.name, c.instructor, c.start_time, c.capacity
            FROM bookings b
            JOIN classes c ON c.class_id = b.class_id
            WHERE b.client_email = $1
            ORDER BY c.start_time ASC, b.booking_id ASC
            "#,
        )
        .bind(email)
        .fetch_all(pool)
        .await;

        let rows = observe_query("list_bookings_for_email", start, result)?;

        rows.iter()
            .map(map_row_to_booking_with_class)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}

fn map_row_to_booking_with_class(row: &PgRow) -> Result<BookingWithClass, sqlx::Error> {
    Ok(BookingWithClass {
        booking: Booking {
            booking_id: row.try_get("booking_id")?,
            class_id: row.try_get("class_id")?,
            client_name: row.try_get("client_name")?,
            client_email: row.try_get("client_email")?,
            booked_at: row.try_get("booked_at")?,
        },
        class: map_row_to_class(row)?,
    })
}
