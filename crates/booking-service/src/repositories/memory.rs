//! In-memory [`BookingStore`] for tests and local development.
//!
//! A unit of work holds the store's async mutex from `begin` until it is
//! committed or dropped, so units of work never interleave. Writes are staged
//! and only applied on `commit`. The same unique and capacity rules as the
//! database schema are enforced on insert.

use super::{
    BookingStore, StoreError, UnitOfWork, BOOKING_CAPACITY_CONSTRAINT, BOOKING_UNIQUE_CONSTRAINT,
    USER_EMAIL_UNIQUE_CONSTRAINT,
};
use crate::models::{
    Booking, BookingWithClass, ClassAvailability, ClassSession, NewBooking, NewClassSession,
    NewUser, User,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct State {
    classes: BTreeMap<i64, ClassSession>,
    bookings: Vec<Booking>,
    users: Vec<User>,
    next_class_id: i64,
    next_booking_id: i64,
    next_user_id: i64,
}

impl State {
    fn add_class(&mut self, class: NewClassSession) -> ClassSession {
        self.next_class_id += 1;
        let class = ClassSession {
            class_id: self.next_class_id,
            name: class.name,
            instructor: class.instructor,
            start_time: class.start_time,
            capacity: class.capacity,
        };
        self.classes.insert(class.class_id, class.clone());
        class
    }

    fn count_for_class(&self, class_id: i64) -> usize {
        self.bookings
            .iter()
            .filter(|b| b.class_id == class_id)
            .count()
    }
}

/// Store kept entirely in process memory.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<Mutex<State>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `classes`, assigned ids 1, 2, ... in order.
    pub fn with_classes(classes: Vec<NewClassSession>) -> Self {
        let mut state = State::default();
        for class in classes {
            state.add_class(class);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
            unavailable: Arc::default(),
        }
    }

    /// Add a class and return it with its assigned id.
    pub async fn insert_class(&self, class: NewClassSession) -> ClassSession {
        self.state.lock().await.add_class(class)
    }

    /// Committed bookings for a class.
    pub async fn booking_count(&self, class_id: i64) -> usize {
        self.state.lock().await.count_for_class(class_id)
    }

    /// Snapshot of every committed booking.
    pub async fn bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.clone()
    }

    /// Make every subsequent operation fail as if storage were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unit of work holding the store lock.
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<State>,
    staged: Vec<Booking>,
}

impl InMemoryUnitOfWork {
    fn visible_bookings(&self) -> impl Iterator<Item = &Booking> {
        self.guard.bookings.iter().chain(self.staged.iter())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn get_class(&mut self, class_id: i64) -> Result<Option<ClassSession>, StoreError> {
        Ok(self.guard.classes.get(&class_id).cloned())
    }

    async fn count_bookings(&mut self, class_id: i64) -> Result<i64, StoreError> {
        let count = self
            .visible_bookings()
            .filter(|b| b.class_id == class_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn find_booking(
        &mut self,
        class_id: i64,
        email: &str,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(self
            .visible_bookings()
            .find(|b| b.class_id == class_id && b.client_email == email)
            .cloned())
    }

    async fn insert_booking(&mut self, booking: &NewBooking) -> Result<Booking, StoreError> {
        if self
            .visible_bookings()
            .any(|b| b.class_id == booking.class_id && b.client_email == booking.client_email)
        {
            return Err(StoreError::UniqueViolation(
                BOOKING_UNIQUE_CONSTRAINT.to_string(),
            ));
        }

        let capacity = match self.guard.classes.get(&booking.class_id) {
            Some(class) => usize::try_from(class.capacity).unwrap_or(0),
            None => {
                return Err(StoreError::Database(format!(
                    "class {} does not exist",
                    booking.class_id
                )));
            }
        };
        let held = self
            .visible_bookings()
            .filter(|b| b.class_id == booking.class_id)
            .count();
        if held >= capacity {
            return Err(StoreError::CapacityViolation(
                BOOKING_CAPACITY_CONSTRAINT.to_string(),
            ));
        }

        self.guard.next_booking_id += 1;
        let stored = Booking {
            booking_id: self.guard.next_booking_id,
            class_id: booking.class_id,
            client_name: booking.client_name.clone(),
            client_email: booking.client_email.clone(),
            booked_at: booking.booked_at,
        };
        self.staged.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let InMemoryUnitOfWork { mut guard, staged } = *self;
        guard.bookings.extend(staged);
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        self.check_available()?;
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(InMemoryUnitOfWork {
            guard,
            staged: Vec::new(),
        }))
    }

    async fn list_classes_with_availability(&self) -> Result<Vec<ClassAvailability>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;

        let mut listing: Vec<ClassAvailability> = state
            .classes
            .values()
            .map(|class| ClassAvailability {
                class: class.clone(),
                booked_count: i64::try_from(state.count_for_class(class.class_id))
                    .unwrap_or(i64::MAX),
            })
            .collect();
        listing.sort_by_key(|a| (a.class.start_time, a.class.class_id));
        Ok(listing)
    }

    async fn list_bookings_for_email(
        &self,
        email: &str,
    ) -> Result<Vec<BookingWithClass>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;

        let mut found: Vec<BookingWithClass> = state
            .bookings
            .iter()
            .filter(|b| b.client_email == email)
            .filter_map(|b| {
                state.classes.get(&b.class_id).map(|class| BookingWithClass {
                    booking: b.clone(),
                    class: class.clone(),
                })
            })
            .collect();
        found.sort_by_key(|r| (r.class.start_time, r.booking.booking_id));
        Ok(found)
    }

    async fn seed_classes_if_empty(&self, classes: &[NewClassSession]) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if !state.classes.is_empty() {
            return Ok(0);
        }
        for class in classes {
            state.add_class(class.clone());
        }
        Ok(u64::try_from(classes.len()).unwrap_or(u64::MAX))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation(
                USER_EMAIL_UNIQUE_CONSTRAINT.to_string(),
            ));
        }

        state.next_user_id += 1;
        let created = User {
            user_id: state.next_user_id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        state.users.push(created.clone());
        Ok(created)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn class(name: &str, capacity: i32, offset_hours: i64) -> NewClassSession {
        NewClassSession {
            name: name.to_string(),
            instructor: "Guru".to_string(),
            start_time: Utc::now() + Duration::hours(offset_hours),
            capacity,
        }
    }

    fn new_booking(class_id: i64, email: &str) -> NewBooking {
        NewBooking {
            class_id,
            client_name: "Client".to_string(),
            client_email: email.to_string(),
            booked_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_makes_staged_bookings_visible() {
        let store = InMemoryBookingStore::with_classes(vec![class("Yoga", 2, 24)]);

        let mut uow = store.begin().await.unwrap();
        uow.insert_booking(&new_booking(1, "a@x.com")).await.unwrap();
        assert_eq!(uow.count_bookings(1).await.unwrap(), 1);
        uow.commit().await.unwrap();

        assert_eq!(store.booking_count(1).await, 1);
    }

    #[tokio::test]
    async fn test_drop_without_commit_discards_writes() {
        let store = InMemoryBookingStore::with_classes(vec![class("Yoga", 2, 24)]);

        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_booking(&new_booking(1, "a@x.com")).await.unwrap();
        }

        assert_eq!(store.booking_count(1).await, 0);
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_and_capacity() {
        let store = InMemoryBookingStore::with_classes(vec![class("HIIT", 1, 24)]);

        let mut uow = store.begin().await.unwrap();
        uow.insert_booking(&new_booking(1, "a@x.com")).await.unwrap();

        let dup = uow.insert_booking(&new_booking(1, "a@x.com")).await;
        assert!(matches!(dup, Err(StoreError::UniqueViolation(_))));

        let full = uow.insert_booking(&new_booking(1, "b@x.com")).await;
        assert!(matches!(full, Err(StoreError::CapacityViolation(_))));
    }

    #[tokio::test]
    async fn test_listing_is_ordered_by_start_time() {
        let store = InMemoryBookingStore::with_classes(vec![
            class("Late", 2, 48),
            class("Early", 2, 12),
        ]);

        let listing = store.list_classes_with_availability().await.unwrap();
        let names: Vec<&str> = listing.iter().map(|a| a.class.name.as_str()).collect();
        assert_eq!(names, vec!["Early", "Late"]);
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let store = InMemoryBookingStore::new();

        let first = store
            .seed_classes_if_empty(&[class("Yoga", 3, 24), class("Zumba", 4, 30)])
            .await
            .unwrap();
        assert_eq!(first, 2);

        let second = store
            .seed_classes_if_empty(&[class("Yoga", 3, 24)])
            .await
            .unwrap();
        assert_eq!(second, 0);
        assert_eq!(store.list_classes_with_availability().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_user_email_rejected() {
        let store = InMemoryBookingStore::new();
        let user = NewUser {
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "hash".to_string(),
        };

        store.create_user(&user).await.unwrap();
        let again = store.create_user(&user).await;
        assert!(matches!(again, Err(StoreError::UniqueViolation(_))));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_operation() {
        let store = InMemoryBookingStore::with_classes(vec![class("Yoga", 2, 24)]);
        store.set_unavailable(true);

        assert!(matches!(store.ping().await, Err(StoreError::Database(_))));
        assert!(store.begin().await.is_err());
        assert!(store.list_classes_with_availability().await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
