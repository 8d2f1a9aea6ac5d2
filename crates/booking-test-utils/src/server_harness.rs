//! Test server harness for E2E testing
//!
//! Provides `TestBookingServer` for spawning real booking server instances in
//! tests, backed either by an in-memory store or by a `#[sqlx::test]` pool.

use booking_service::config::Config;
use booking_service::observability::metrics::detached_metrics_handle;
use booking_service::repositories::{BookingStore, InMemoryBookingStore, PgBookingStore};
use booking_service::routes;
use booking_service::services::notifier::mock::MockNotifier;
use booking_service::services::notifier::Notifier;
use booking_service::startup::build_state;
use sqlx::PgPool;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the booking service in E2E tests.
///
/// Confirmations go to a [`MockNotifier`] reachable through
/// [`TestBookingServer::notifier`].
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() -> Result<()> {
///     let server = TestBookingServer::spawn_in_memory(InMemoryBookingStore::new()).await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestBookingServer {
    addr: SocketAddr,
    pool: Option<PgPool>,
    config: Config,
    notifier: Arc<MockNotifier>,
    _handle: JoinHandle<()>,
}

impl TestBookingServer {
    /// Spawn a server over an isolated PostgreSQL database.
    ///
    /// # Arguments
    /// * `pool` - Database connection pool (typically from `#[sqlx::test]`)
    pub async fn spawn(pool: PgPool) -> Result<Self, anyhow::Error> {
        let config = test_config("postgres")?;
        let store: Arc<dyn BookingStore> = Arc::new(PgBookingStore::new(pool.clone()));
        Self::spawn_with(config, store, Some(pool)).await
    }

    /// Spawn a server over an in-memory store. Clones of `store` observe the
    /// server's writes.
    pub async fn spawn_in_memory(store: InMemoryBookingStore) -> Result<Self, anyhow::Error> {
        let config = test_config("memory")?;
        Self::spawn_with(config, Arc::new(store), None).await
    }

    async fn spawn_with(
        config: Config,
        store: Arc<dyn BookingStore>,
        pool: Option<PgPool>,
    ) -> Result<Self, anyhow::Error> {
        let notifier = Arc::new(MockNotifier::new());
        let state = Arc::new(build_state(
            config.clone(),
            store,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        ));

        // Detached handle: tests must not install the global recorder.
        let app = routes::build_routes(state, detached_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            pool,
            config,
            notifier,
            _handle: handle,
        })
    }

    /// Database pool, when spawned over PostgreSQL.
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Notifier receiving booking confirmations.
    pub fn notifier(&self) -> &MockNotifier {
        &self.notifier
    }
}

impl Drop for TestBookingServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}

fn test_config(backend: &str) -> Result<Config, anyhow::Error> {
    let vars = HashMap::from([
        ("STORE_BACKEND".to_string(), backend.to_string()),
        (
            "DATABASE_URL".to_string(),
            "postgresql://test/test".to_string(),
        ),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
        ("BCRYPT_COST".to_string(), "10".to_string()),
        ("STUDIO_NAME".to_string(), "Test Studio".to_string()),
    ]);

    Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))
}
