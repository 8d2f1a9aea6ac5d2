//! Booking service models.
//!
//! Contains the stored entities (classes, bookings, users) and the request
//! and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a client display name on a booking.
pub const MAX_CLIENT_NAME_LENGTH: usize = 120;

/// Maximum length of an email address, matching the `VARCHAR(320)` columns.
pub const MAX_EMAIL_LENGTH: usize = 320;

/// Minimum password length for user registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

// ============================================================================
// Stored entities
// ============================================================================

/// A scheduled fitness class with a fixed capacity.
///
/// Rows are seeded once and never modified by the service.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ClassSession {
    /// Class identifier.
    pub class_id: i64,

    /// Display name (e.g. "Yoga").
    pub name: String,

    /// Instructor name.
    pub instructor: String,

    /// Scheduled start, stored in UTC.
    pub start_time: DateTime<Utc>,

    /// Maximum number of bookings (always > 0).
    pub capacity: i32,
}

/// Class definition used when seeding the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClassSession {
    pub name: String,
    pub instructor: String,
    pub start_time: DateTime<Utc>,
    pub capacity: i32,
}

/// A committed reservation of one slot in a class.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Booking {
    /// Booking identifier (server assigned).
    pub booking_id: i64,

    /// Class this booking reserves a slot in.
    pub class_id: i64,

    /// Requester display name (trimmed).
    pub client_name: String,

    /// Requester email (normalized).
    pub client_email: String,

    /// When the booking was admitted.
    pub booked_at: DateTime<Utc>,
}

/// Booking row to be written by the admission controller.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub class_id: i64,
    pub client_name: String,
    pub client_email: String,
    pub booked_at: DateTime<Utc>,
}

/// A class together with its live booking count.
#[derive(Debug, Clone)]
pub struct ClassAvailability {
    pub class: ClassSession,
    pub booked_count: i64,
}

impl ClassAvailability {
    /// Remaining slots at the time the count was read.
    pub fn available_slots(&self) -> i64 {
        i64::from(self.class.capacity) - self.booked_count
    }
}

/// A booking joined with the class it belongs to.
#[derive(Debug, Clone)]
pub struct BookingWithClass {
    pub booking: Booking,
    pub class: ClassSession,
}

/// Result of a successful admission: the committed booking plus the class
/// display fields needed for confirmation messaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRecord {
    pub booking: Booking,
    pub class_name: String,
    pub instructor: String,
    pub start_time: DateTime<Utc>,
}

/// Registered client account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User row to be written on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// ============================================================================
// Input normalization
// ============================================================================

/// Normalize an email for comparison and storage: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email validation: `local@domain.tld` with no whitespace and at most
/// [`MAX_EMAIL_LENGTH`] characters.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return false;
    }

    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    domain_parts.len() >= 2 && domain_parts.iter().all(|p| !p.is_empty())
}

// ============================================================================
// API Models
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy" or "unhealthy").
    pub status: String,

    /// Store connectivity status.
    pub database: String,

    /// Current server time (RFC 3339, UTC).
    pub time: String,
}

/// Request body for `POST /book`.
#[derive(Debug, Clone, Deserialize)]
pub struct BookRequest {
    pub class_id: i64,
    pub client_name: String,
    pub client_email: String,
}

impl BookRequest {
    /// Validate the request shape before it reaches the admission controller.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.class_id <= 0 {
            return Err("class_id must be a positive integer");
        }

        let name = self.client_name.trim();
        if name.is_empty() {
            return Err("client_name cannot be empty");
        }
        if name.chars().count() > MAX_CLIENT_NAME_LENGTH {
            return Err("client_name must be at most 120 characters");
        }

        if !is_valid_email(&normalize_email(&self.client_email)) {
            return Err("client_email must be a valid email address");
        }

        Ok(())
    }
}

/// Booking as returned by `POST /book` and `GET /bookings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: i64,
    pub class_id: i64,
    pub client_name: String,
    pub client_email: String,
    /// Creation time (RFC 3339, UTC).
    pub created_at: String,
    pub class_name: String,
    pub instructor: String,
    /// Class start rendered in `timezone`.
    pub start_time: String,
    pub timezone: String,
}

/// Class as returned by `GET /classes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassListingResponse {
    pub id: i64,
    pub name: String,
    pub instructor: String,
    /// Class start rendered in `timezone`.
    pub start_time: String,
    pub timezone: String,
    pub capacity: i32,
    pub available_slots: i64,
}

/// Query string for `GET /classes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassesQuery {
    pub tz: Option<String>,
}

/// Query string for `GET /bookings`.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingsQuery {
    pub email: String,
    pub tz: Option<String>,
}

/// Request body for `POST /users`.
#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: secrecy::SecretString,
}

/// Response for `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
}
