//! HTTP request handlers for the booking service.

pub mod bookings;
pub mod classes;
pub mod health;
pub mod metrics;
pub mod users;

pub use bookings::{book_class, list_bookings};
pub use classes::list_classes;
pub use health::health_check;
pub use metrics::metrics_handler;
pub use users::register_user;
