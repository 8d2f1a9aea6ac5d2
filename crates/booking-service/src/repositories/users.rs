//! Users repository.

use super::{observe_query, StoreError};
use crate::models::{NewUser, User};
use sqlx::PgExecutor;
use std::time::Instant;
use tracing::instrument;

/// Users repository for database operations.
pub struct UsersRepository;

impl UsersRepository {
    /// Insert a user. A taken email surfaces as `UniqueViolation`.
    #[instrument(skip_all, name = "booking.repo.create_user")]
    pub async fn create<'e, E>(executor: E, user: &NewUser) -> Result<User, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let start = Instant::now();

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING user_id, name, email, password_hash, created_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(executor)
        .await;

        observe_query("create_user", start, result)
    }
}
