//! Wiring from configuration to a running application state.

use crate::config::{Config, StoreBackend};
use crate::repositories::{BookingStore, InMemoryBookingStore, PgBookingStore};
use crate::routes::AppState;
use crate::services::admission::{AdmissionController, AdmissionSettings};
use crate::services::notifier::{LogNotifier, Notifier, SmtpNotifier};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Missing required environment variable: {0}")]
    MissingDatabaseUrl(String),

    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Open the connection pool with a per-statement timeout.
pub async fn connect_pool(config: &Config) -> Result<PgPool, StartupError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| StartupError::MissingDatabaseUrl("DATABASE_URL".to_string()))?;

    let url = add_statement_timeout(url, config.db_statement_timeout_seconds);
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&url)
        .await?;

    Ok(pool)
}

/// Apply pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StartupError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Build the store selected by `config`, connecting and migrating when it
/// is PostgreSQL.
pub async fn build_store(config: &Config) -> Result<Arc<dyn BookingStore>, StartupError> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let pool = connect_pool(config).await?;
            info!("Database connection established");
            run_migrations(&pool).await?;
            info!("Migrations applied");
            Ok(Arc::new(PgBookingStore::new(pool)))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(InMemoryBookingStore::new()))
        }
    }
}

/// SMTP notifier when a relay is configured, otherwise the log notifier.
pub fn build_notifier(config: &Config) -> Arc<dyn Notifier> {
    let Some(smtp) = &config.smtp else {
        info!("SMTP not configured, confirmations will be logged");
        return Arc::new(LogNotifier);
    };

    match SmtpNotifier::new(smtp, config.mail_from.clone()) {
        Ok(notifier) => {
            info!(host = %smtp.host, port = smtp.port, "SMTP notifier configured");
            Arc::new(notifier)
        }
        Err(e) => {
            warn!(error = %e, "SMTP notifier unavailable, confirmations will be logged");
            Arc::new(LogNotifier)
        }
    }
}

/// Assemble the shared handler state.
pub fn build_state(
    config: Config,
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
) -> AppState {
    let admission = AdmissionController::new(
        Arc::clone(&store),
        notifier,
        AdmissionSettings {
            notification_timezone: config.default_timezone,
            studio_name: config.studio_name.clone(),
        },
    );

    AppState {
        store,
        config,
        admission,
    }
}

/// Append a `statement_timeout` option to a PostgreSQL URL.
pub fn add_statement_timeout(url: &str, timeout_secs: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn memory_config(extra: &[(&str, &str)]) -> Config {
        let mut vars = HashMap::from([("STORE_BACKEND".to_string(), "memory".to_string())]);
        for (k, v) in extra {
            vars.insert((*k).to_string(), (*v).to_string());
        }
        Config::from_vars(&vars).unwrap()
    }

    #[test]
    fn test_add_statement_timeout() {
        assert_eq!(
            add_statement_timeout("postgresql://localhost/booking", 5),
            "postgresql://localhost/booking?options=-c%20statement_timeout%3D5s"
        );
        assert_eq!(
            add_statement_timeout("postgresql://localhost/booking?sslmode=disable", 3),
            "postgresql://localhost/booking?sslmode=disable&options=-c%20statement_timeout%3D3s"
        );
    }

    #[tokio::test]
    async fn test_build_store_memory() {
        let store = build_store(&memory_config(&[])).await.unwrap();
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_pool_requires_database_url() {
        let result = connect_pool(&memory_config(&[])).await;
        assert!(matches!(result, Err(StartupError::MissingDatabaseUrl(_))));
    }

    #[tokio::test]
    async fn test_build_notifier_with_smtp() {
        let config = memory_config(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASS", "secret"),
        ]);
        // Construction must not touch the network.
        let _notifier = build_notifier(&config);
    }

    #[tokio::test]
    async fn test_build_state_uses_config() {
        let config = memory_config(&[("STUDIO_NAME", "Test Studio")]);
        let store: Arc<dyn BookingStore> = Arc::new(InMemoryBookingStore::new());
        let state = build_state(config, store, Arc::new(LogNotifier));

        assert_eq!(state.config.studio_name, "Test Studio");
        assert!(state.store.ping().await.is_ok());
    }
}
