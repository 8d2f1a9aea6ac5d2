//! Timezone resolution and instant formatting.
//!
//! Instants are stored in UTC. Responses render them in a timezone the client
//! asks for; unknown names fall back to the configured default.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// Resolve a requested IANA timezone name, falling back to `default` when
/// the name is missing, blank, or unknown.
pub fn resolve_timezone(requested: Option<&str>, default: Tz) -> Tz {
    requested
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(default)
}

/// Render an instant in `tz` as RFC 3339 with whole seconds.
pub fn format_in_timezone(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render an instant as RFC 3339 UTC with whole seconds (`...Z`).
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a wall-clock time on `date` in `tz` to UTC.
///
/// Ambiguous local times take the earlier instant. Returns `None` for times
/// that do not exist in `tz` (DST gaps) or out-of-range fields.
pub fn local_to_utc(date: NaiveDate, hour: u32, minute: u32, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
