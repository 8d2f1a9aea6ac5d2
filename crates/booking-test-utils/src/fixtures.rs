//! Class fixtures for tests.

use booking_service::models::{ClassSession, NewClassSession};
use chrono::{Duration, Utc};
use sqlx::PgPool;

/// A class starting `hours_from_now` hours from now.
pub fn class_fixture(
    name: &str,
    instructor: &str,
    capacity: i32,
    hours_from_now: i64,
) -> NewClassSession {
    NewClassSession {
        name: name.to_string(),
        instructor: instructor.to_string(),
        start_time: Utc::now() + Duration::hours(hours_from_now),
        capacity,
    }
}

/// Insert a class directly into PostgreSQL and return it with its id.
pub async fn insert_class(
    pool: &PgPool,
    class: &NewClassSession,
) -> Result<ClassSession, sqlx::Error> {
    sqlx::query_as::<_, ClassSession>(
        r#"
        INSERT INTO classes (name, instructor, start_time, capacity)
        VALUES ($1, $2, $3, $4)
        RETURNING class_id, name, instructor, start_time, capacity
        "#,
    )
    .bind(&class.name)
    .bind(&class.instructor)
    .bind(class.start_time)
    .bind(class.capacity)
    .fetch_one(pool)
    .await
}

/// Committed bookings for a class, counted directly in PostgreSQL.
pub async fn count_bookings(pool: &PgPool, class_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE class_id = $1")
        .bind(class_id)
        .fetch_one(pool)
        .await
}
