//! HTTP routes for the booking service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics::http_metrics_middleware;
use crate::repositories::BookingStore;
use crate::services::admission::AdmissionController;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistence store (PostgreSQL or in-memory).
    pub store: Arc<dyn BookingStore>,

    /// Service configuration.
    pub config: Config,

    /// Booking admission controller.
    pub admission: AdmissionController,
}

/// Build the application routes.
///
/// - `POST /book` - admit a booking
/// - `GET /classes` - class listing with live availability
/// - `GET /bookings` - bookings held by an email
/// - `POST /users` - register a client
/// - `GET /health` - store connectivity
/// - `GET /metrics` - Prometheus metrics
///
/// Layers: 30 second timeout, request tracing, and HTTP metrics outermost so
/// framework-level rejections are counted.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/classes", get(handlers::list_classes))
        .route("/book", post(handlers::book_class))
        .route("/bookings", get(handlers::list_bookings))
        .route("/users", post(handlers::register_user))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    api_routes
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
