//! Fitness Class Booking Service Library
//!
//! Backend for booking slots in scheduled fitness classes. Clients register,
//! browse classes with live availability, and book one slot per class.
//!
//! # Architecture
//!
//! Handler -> Service -> Repository:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//! ```
//!
//! The admission controller (`services::admission`) is the only writer of
//! bookings. It runs inside a store unit of work that serializes admissions
//! per class, so capacity is never exceeded and an email holds at most one
//! slot per class under concurrent requests.
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Entities and API bodies
//! - `observability` - Metrics
//! - `repositories` - Store traits, PostgreSQL and in-memory stores
//! - `routes` - Axum router setup
//! - `services` - Admission, listings, registration, notifications, seeding
//! - `startup` - Store, notifier, and state wiring

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod startup;
