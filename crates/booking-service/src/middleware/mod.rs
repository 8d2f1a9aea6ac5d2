//! HTTP middleware for the booking service.

pub mod http_metrics;
