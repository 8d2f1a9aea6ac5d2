//! Business logic for the booking service.

pub mod admission;
pub mod catalog;
pub mod notifier;
pub mod seed;
pub mod timezone;
pub mod users;
