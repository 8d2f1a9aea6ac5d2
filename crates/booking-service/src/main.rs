//! Fitness Class Booking Service
//!
//! Entry point: loads configuration, connects the store, seeds sample
//! classes, and serves the HTTP API until SIGINT/SIGTERM.

use booking_service::config::Config;
use booking_service::observability::metrics::init_metrics_recorder;
use booking_service::routes;
use booking_service::services::seed::seed_default_classes;
use booking_service::startup;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_service=debug,booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Booking Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        store_backend = ?config.store_backend,
        bind_address = %config.bind_address,
        default_timezone = %config.default_timezone.name(),
        smtp_enabled = config.smtp.is_some(),
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let store = startup::build_store(&config).await.map_err(|e| {
        error!("Failed to initialize store: {}", e);
        e
    })?;

    if config.seed_on_startup {
        if let Err(e) = seed_default_classes(store.as_ref(), config.default_timezone).await {
            warn!("Seeding sample classes failed: {}", e);
        }
    }

    let notifier = startup::build_notifier(&config);
    let bind_address = config.bind_address.clone();
    let state = Arc::new(startup::build_state(config, store, notifier));

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Booking Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Booking Service shutdown complete");

    Ok(())
}

/// Returns when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
