//! Admission controller integration tests against the in-memory store.
//!
//! Concurrent requests run on a multi-threaded runtime so admissions really
//! race for the same class.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use booking_service::errors::AdmissionError;
use booking_service::repositories::InMemoryBookingStore;
use booking_service::services::admission::{AdmissionController, AdmissionSettings};
use booking_service::services::notifier::mock::MockNotifier;
use booking_service::services::notifier::Notifier;
use booking_test_utils::class_fixture;
use std::sync::Arc;
use std::time::Duration;

fn controller(store: &InMemoryBookingStore, notifier: &Arc<MockNotifier>) -> AdmissionController {
    AdmissionController::new(
        Arc::new(store.clone()),
        Arc::clone(notifier) as Arc<dyn Notifier>,
        AdmissionSettings {
            notification_timezone: chrono_tz::Asia::Kolkata,
            studio_name: "Test Studio".to_string(),
        },
    )
}

async fn single_class_store(capacity: i32) -> (InMemoryBookingStore, i64) {
    let store = InMemoryBookingStore::new();
    let class = store
        .insert_class(class_fixture("Yoga", "Keneshia", capacity, 24))
        .await;
    (store, class.class_id)
}

#[tokio::test]
async fn test_books_until_capacity_then_rejects() {
    let (store, class_id) = single_class_store(2).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    let first = admission
        .attempt_booking(class_id, "Asha", "asha@x.com")
        .await
        .unwrap();
    assert_eq!(first.booking.class_id, class_id);
    assert_eq!(first.class_name, "Yoga");

    admission
        .attempt_booking(class_id, "Ravi", "ravi@x.com")
        .await
        .unwrap();

    let third = admission
        .attempt_booking(class_id, "Meena", "meena@x.com")
        .await;
    assert_eq!(third.unwrap_err(), AdmissionError::CapacityExceeded);
    assert_eq!(store.booking_count(class_id).await, 2);
}

#[tokio::test]
async fn test_duplicate_email_is_case_insensitive() {
    let (store, class_id) = single_class_store(5).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    admission
        .attempt_booking(class_id, "Asha", "asha@x.com")
        .await
        .unwrap();

    let again = admission
        .attempt_booking(class_id, "Asha", "  ASHA@X.com ")
        .await;
    assert_eq!(again.unwrap_err(), AdmissionError::DuplicateBooking);
    assert_eq!(store.booking_count(class_id).await, 1);
}

#[tokio::test]
async fn test_unknown_class_is_not_found() {
    let (store, _) = single_class_store(5).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    let result = admission.attempt_booking(999, "Asha", "asha@x.com").await;

    assert_eq!(result.unwrap_err(), AdmissionError::ClassNotFound);
    assert!(store.bookings().await.is_empty());
}

#[tokio::test]
async fn test_full_class_reports_capacity_before_duplicate() {
    let (store, class_id) = single_class_store(1).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    admission
        .attempt_booking(class_id, "Asha", "asha@x.com")
        .await
        .unwrap();

    let result = admission
        .attempt_booking(class_id, "Asha", "asha@x.com")
        .await;
    assert_eq!(result.unwrap_err(), AdmissionError::CapacityExceeded);
}

#[tokio::test]
async fn test_same_email_may_book_different_classes() {
    let store = InMemoryBookingStore::new();
    let yoga = store.insert_class(class_fixture("Yoga", "Keneshia", 2, 24)).await;
    let zumba = store.insert_class(class_fixture("Zumba", "Guru", 2, 48)).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    admission
        .attempt_booking(yoga.class_id, "Asha", "asha@x.com")
        .await
        .unwrap();
    admission
        .attempt_booking(zumba.class_id, "Asha", "asha@x.com")
        .await
        .unwrap();

    assert_eq!(store.bookings().await.len(), 2);
}

#[tokio::test]
async fn test_unavailable_store_is_retryable_error() {
    let (store, class_id) = single_class_store(5).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    store.set_unavailable(true);
    let result = admission
        .attempt_booking(class_id, "Asha", "asha@x.com")
        .await;
    assert!(matches!(
        result.unwrap_err(),
        AdmissionError::StorageUnavailable(_)
    ));

    store.set_unavailable(false);
    admission
        .attempt_booking(class_id, "Asha", "asha@x.com")
        .await
        .unwrap();
    assert_eq!(store.booking_count(class_id).await, 1);
}

#[tokio::test]
async fn test_confirmation_sent_after_admission() {
    let (store, class_id) = single_class_store(5).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    admission
        .attempt_booking(class_id, "Asha", "Asha@X.com")
        .await
        .unwrap();

    assert!(notifier.wait_for_calls(1, Duration::from_secs(2)).await);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "asha@x.com");
    assert_eq!(sent[0].subject, "Booking Confirmed: Yoga");
    assert!(sent[0].body.contains("Hi Asha,"));
    assert!(sent[0].body.contains("Test Studio"));
}

#[tokio::test]
async fn test_notifier_failure_keeps_booking() {
    let (store, class_id) = single_class_store(5).await;
    let notifier = Arc::new(MockNotifier::failing());
    let admission = controller(&store, &notifier);

    let record = admission
        .attempt_booking(class_id, "Asha", "asha@x.com")
        .await
        .unwrap();

    assert!(notifier.wait_for_calls(1, Duration::from_secs(2)).await);
    let stored = store.bookings().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].booking_id, record.booking.booking_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_exceed_capacity() {
    let (store, class_id) = single_class_store(4).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let admission = admission.clone();
            tokio::spawn(async move {
                admission
                    .attempt_booking(class_id, &format!("Client {i}"), &format!("client{i}@x.com"))
                    .await
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let full = results
        .iter()
        .filter(|r| matches!(r, Err(AdmissionError::CapacityExceeded)))
        .count();

    assert_eq!(admitted, 4);
    assert_eq!(full, 6);
    assert_eq!(store.booking_count(class_id).await, 4);

    // Only admitted bookings are confirmed.
    assert!(notifier.wait_for_calls(4, Duration::from_secs(2)).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(notifier.call_count(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_email_admits_once() {
    let (store, class_id) = single_class_store(10).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let admission = admission.clone();
            tokio::spawn(async move {
                admission
                    .attempt_booking(class_id, "Asha", "asha@x.com")
                    .await
            })
        })
        .collect();

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(AdmissionError::DuplicateBooking))));
    assert_eq!(store.booking_count(class_id).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_across_classes_are_independent() {
    let store = InMemoryBookingStore::new();
    let yoga = store.insert_class(class_fixture("Yoga", "Keneshia", 3, 24)).await;
    let zumba = store.insert_class(class_fixture("Zumba", "Guru", 2, 48)).await;
    let notifier = Arc::new(MockNotifier::new());
    let admission = controller(&store, &notifier);

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let admission = admission.clone();
            let class_id = if i % 2 == 0 { yoga.class_id } else { zumba.class_id };
            tokio::spawn(async move {
                admission
                    .attempt_booking(class_id, "Client", &format!("client{i}@x.com"))
                    .await
            })
        })
        .collect();

    for joined in futures::future::join_all(handles).await {
        let result = joined.unwrap();
        assert!(matches!(
            result,
            Ok(_) | Err(AdmissionError::CapacityExceeded)
        ));
    }

    assert_eq!(store.booking_count(yoga.class_id).await, 3);
    assert_eq!(store.booking_count(zumba.class_id).await, 2);
}
