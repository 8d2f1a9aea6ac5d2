//! PostgreSQL-backed [`BookingStore`].

use super::bookings::BookingsRepository;
use super::classes::ClassesRepository;
use super::users::UsersRepository;
use super::{observe_query, BookingStore, StoreError, UnitOfWork};
use crate::models::{
    Booking, BookingWithClass, ClassAvailability, ClassSession, NewBooking, NewClassSession,
    NewUser, User,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Instant;

/// Store over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// One database transaction. Rolled back on drop unless committed.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn get_class(&mut self, class_id: i64) -> Result<Option<ClassSession>, StoreError> {
        ClassesRepository::get_for_update(&mut *self.tx, class_id).await
    }

    async fn count_bookings(&mut self, class_id: i64) -> Result<i64, StoreError> {
        BookingsRepository::count_for_class(&mut *self.tx, class_id).await
    }

    async fn find_booking(
        &mut self,
        class_id: i64,
        email: &str,
    ) -> Result<Option<Booking>, StoreError> {
        BookingsRepository::find(&mut *self.tx, class_id, email).await
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, StoreError> {
        BookingsRepository::insert(&mut *self.tx, booking).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = self.tx.commit().await;
        observe_query("commit", start, result)
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let start = Instant::now();
        let tx = observe_query("begin", start, self.pool.begin().await)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn list_classes_with_availability(&self) -> Result<Vec<ClassAvailability>, StoreError> {
        ClassesRepository::list_with_availability(&self.pool).await
    }

    async fn list_bookings_for_email(
        &self,
        email: &str,
    ) -> Result<Vec<BookingWithClass>, StoreError> {
        BookingsRepository::list_for_email(&self.pool, email).await
    }

    async fn seed_classes_if_empty(&self, classes: &[NewClassSession]) -> Result<u64, StoreError> {
        ClassesRepository::seed_if_empty(&self.pool, classes).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        UsersRepository::create(&self.pool, user).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = sqlx::query("SELECT 1").execute(&self.pool).await;
        observe_query("ping", start, result).map(|_| ())
    }
}
