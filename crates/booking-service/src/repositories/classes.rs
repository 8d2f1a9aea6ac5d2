//! Classes repository.
//!
//! Class rows are written once by seeding and then only read. Admission reads
//! them with `FOR UPDATE` so that concurrent admissions to the same class
//! queue behind each other for the rest of their transaction.

use super::{observe_query, StoreError};
use crate::models::{ClassAvailability, ClassSession, NewClassSession};
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use std::time::Instant;
use tracing::instrument;

/// Classes repository for database operations.
pub struct ClassesRepository;

impl ClassesRepository {
    /// Fetch a class and lock its row until the enclosing transaction ends.
    #[instrument(skip_all, name = "booking.repo.get_class_for_update", fields(class_id = class_id))]
    pub async fn get_for_update<'e, E>(
        executor: E,
        class_id: i64,
    ) -> Result<Option<ClassSession>, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let start = Instant::now();

        let result = sqlx::query_as::<_, ClassSession>(
            r#"
            SELECT class_id, name, instructor, start_time, capacity
            FROM classes
            WHERE class_id = $1
            FOR UPDATE
            "#,
        )
        .bind(class_id)
        .fetch_optional(executor)
        .await;

        observe_query("get_class_for_update", start, result)
    }

    /// All classes ordered by start time, with the number of bookings each
    /// currently holds.
    #[instrument(skip_all, name = "booking.repo.list_classes")]
    pub async fn list_with_availability(
        pool: &PgPool,
    ) -> Result<Vec<ClassAvailability>, StoreError> {
        let start = Instant::now();

        let result = sqlx::query(
            r#"
            SELECT c.class_id, c.name, c.instructor, c.start_time, c.capacity,
                   COUNT(b.booking_id) AS booked_count
            FROM classes c
            LEFT JOIN bookings b ON b.class_id = c.class_id
            GROUP BY c.class_id
            ORDER BY c.start_time ASC, c.class_id ASC
            "#,
        )
        .fetch_all(pool)
        .await;

        let rows = observe_query("list_classes", start, result)?;

        rows.iter()
            .map(map_row_to_availability)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }

    /// Insert `classes` when the table is empty. Returns the number of rows
    /// inserted (zero when classes already exist).
    ///
    /// The table lock makes two instances starting together seed only once.
    #[instrument(skip_all, name = "booking.repo.seed_classes", fields(count = classes.len()))]
    pub async fn seed_if_empty(
        pool: &PgPool,
        classes: &[NewClassSession],
    ) -> Result<u64, StoreError> {
        let start = Instant::now();

        let result: Result<u64, sqlx::Error> = async {
            let mut tx = pool.begin().await?;

            sqlx::query("LOCK TABLE classes IN SHARE ROW EXCLUSIVE MODE")
                .execute(&mut *tx)
                .await?;

            let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classes")
                .fetch_one(&mut *tx)
                .await?;

            if existing > 0 {
                tx.commit().await?;
                return Ok(0);
            }

            let mut inserted = 0;
            for class in classes {
                let done = sqlx::query(
                    r#"
                    INSERT INTO classes (name, instructor, start_time, capacity)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(&class.name)
                .bind(&class.instructor)
                .bind(class.start_time)
                .bind(class.capacity)
                .execute(&mut *tx)
                .await?;
                inserted += done.rows_affected();
            }

            tx.commit().await?;
            Ok(inserted)
        }
        .await;

        observe_query("seed_classes", start, result)
    }
}

/// Map a class row (aliased `c.*` columns) to a [`ClassSession`].
pub(crate) fn map_row_to_class(row: &PgRow) -> Result<ClassSession, sqlx::Error> {
    Ok(ClassSession {
        class_id: row.try_get("class_id")?,
        name: row.try_get("name")?,
        instructor: row.try_get("instructor")?,
        start_time: row.try_get("start_time")?,
        capacity: row.try_get("capacity")?,
    })
}

fn map_row_to_availability(row: &PgRow) -> Result<ClassAvailability, sqlx::Error> {
    Ok(ClassAvailability {
        class: map_row_to_class(row)?,
        booked_count: row.try_get("booked_count")?,
    })
}
