//! Sample class schedule inserted on first startup.

use crate::models::NewClassSession;
use crate::repositories::{BookingStore, StoreError};
use crate::services::timezone::local_to_utc;
use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use tracing::instrument;

/// (name, instructor, days from today, hour, minute, capacity)
const SAMPLE_SCHEDULE: &[(&str, &str, u64, u32, u32, i32)] = &[
    ("Yoga", "Keneshia", 1, 7, 0, 3),
    ("Zumba", "Guru", 1, 18, 0, 4),
    ("HIIT", "Rishi", 2, 7, 0, 2),
    ("Yoga", "Ridhi", 2, 18, 0, 2),
];

/// Sample classes relative to the calendar day of `now` in `tz`, with start
/// times given as wall-clock times in `tz` and stored in UTC.
pub fn sample_classes(now: DateTime<Utc>, tz: Tz) -> Vec<NewClassSession> {
    let today = now.with_timezone(&tz).date_naive();

    SAMPLE_SCHEDULE
        .iter()
        .filter_map(|&(name, instructor, days, hour, minute, capacity)| {
            let date = today.checked_add_days(Days::new(days))?;
            let start_time = local_to_utc(date, hour, minute, tz)?;
            Some(NewClassSession {
                name: name.to_string(),
                instructor: instructor.to_string(),
                start_time,
                capacity,
            })
        })
        .collect()
}

/// Insert the sample classes if the store has none. Returns rows inserted.
#[instrument(skip_all, name = "booking.seed")]
pub async fn seed_default_classes(store: &dyn BookingStore, tz: Tz) -> Result<u64, StoreError> {
    let classes = sample_classes(Utc::now(), tz);
    let inserted = store.seed_classes_if_empty(&classes).await?;

    if inserted > 0 {
        tracing::info!(target: "booking.seed", inserted = inserted, "Seeded sample classes");
    } else {
        tracing::debug!(target: "booking.seed", "Classes already present, seeding skipped");
    }

    Ok(inserted)
}
