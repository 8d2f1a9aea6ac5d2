//! Booking service configuration.
//!
//! Configuration is loaded from environment variables. The database URL and
//! SMTP password are redacted in Debug output.

use chrono_tz::Tz;
use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Timezone used when a request names none or an unknown one.
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Default connection pool size.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Default per-statement timeout in seconds.
pub const DEFAULT_DB_STATEMENT_TIMEOUT_SECONDS: u64 = 5;

/// Default SMTP submission port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address for confirmations.
pub const DEFAULT_MAIL_FROM: &str = "no-reply@fitness.local";

/// Default studio name used in the confirmation signature.
pub const DEFAULT_STUDIO_NAME: &str = "Raagavi Fitness Studio";

/// Default bcrypt cost factor for password hashing.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum accepted bcrypt cost factor.
pub const MIN_BCRYPT_COST: u32 = 10;

/// Maximum accepted bcrypt cost factor.
pub const MAX_BCRYPT_COST: u32 = 14;

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL via `DATABASE_URL`.
    Postgres,
    /// Process memory; data is lost on restart.
    Memory,
}

/// SMTP relay settings. Present only when host, user and password are all set.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Booking service configuration.
#[derive(Clone)]
pub struct Config {
    /// Store implementation (default: postgres).
    pub store_backend: StoreBackend,

    /// PostgreSQL connection URL. Required for the postgres backend.
    pub database_url: Option<String>,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Fallback timezone for listings and the confirmation message.
    pub default_timezone: Tz,

    /// Maximum pooled database connections.
    pub db_max_connections: u32,

    /// Statement timeout applied to every pooled connection.
    pub db_statement_timeout_seconds: u64,

    /// Insert the sample classes when the class table is empty.
    pub seed_on_startup: bool,

    /// Bcrypt cost for user passwords.
    pub bcrypt_cost: u32,

    /// Sender address for confirmations.
    pub mail_from: String,

    /// Studio name in the confirmation signature.
    pub studio_name: String,

    /// SMTP relay; `None` means confirmations are written to the log.
    pub smtp: Option<SmtpConfig>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("store_backend", &self.store_backend)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("bind_address", &self.bind_address)
            .field("default_timezone", &self.default_timezone.name())
            .field("db_max_connections", &self.db_max_connections)
            .field(
                "db_statement_timeout_seconds",
                &self.db_statement_timeout_seconds,
            )
            .field("seed_on_startup", &self.seed_on_startup)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("mail_from", &self.mail_from)
            .field("studio_name", &self.studio_name)
            .field("smtp", &self.smtp)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid store backend: {0}")]
    InvalidStoreBackend(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid database pool configuration: {0}")]
    InvalidPool(String),

    #[error("Invalid SMTP configuration: {0}")]
    InvalidSmtp(String),

    #[error("Invalid bcrypt cost: {0}")]
    InvalidBcryptCost(String),

    #[error("Invalid boolean for {0}: expected true or false")]
    InvalidBool(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let store_backend = match vars.get("STORE_BACKEND").map(|v| v.to_ascii_lowercase()) {
            None => StoreBackend::Postgres,
            Some(v) if v == "postgres" => StoreBackend::Postgres,
            Some(v) if v == "memory" => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidStoreBackend(format!(
                    "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                    other
                )));
            }
        };

        let database_url = vars.get("DATABASE_URL").cloned();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let tz_name = vars
            .get("DEFAULT_TIMEZONE")
            .map(String::as_str)
            .unwrap_or(DEFAULT_TIMEZONE);
        let default_timezone: Tz = tz_name.parse().map_err(|_| {
            ConfigError::InvalidTimezone(format!(
                "DEFAULT_TIMEZONE must be an IANA timezone name, got '{}'",
                tz_name
            ))
        })?;

        let db_max_connections = parse_positive(
            vars,
            "DB_MAX_CONNECTIONS",
            DEFAULT_DB_MAX_CONNECTIONS,
            ConfigError::InvalidPool,
        )?;

        let db_statement_timeout_seconds = parse_positive(
            vars,
            "DB_STATEMENT_TIMEOUT_SECONDS",
            DEFAULT_DB_STATEMENT_TIMEOUT_SECONDS,
            ConfigError::InvalidPool,
        )?;

        let seed_on_startup = match vars.get("SEED_ON_STARTUP").map(|v| v.to_ascii_lowercase()) {
            None => true,
            Some(v) if v == "true" || v == "1" => true,
            Some(v) if v == "false" || v == "0" => false,
            Some(_) => return Err(ConfigError::InvalidBool("SEED_ON_STARTUP".to_string())),
        };

        let bcrypt_cost = if let Some(value_str) = vars.get("BCRYPT_COST") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&value) {
                return Err(ConfigError::InvalidBcryptCost(format!(
                    "BCRYPT_COST must be between {} and {}, got {}",
                    MIN_BCRYPT_COST, MAX_BCRYPT_COST, value
                )));
            }

            value
        } else {
            DEFAULT_BCRYPT_COST
        };

        let mail_from = vars
            .get("SMTP_FROM")
            .cloned()
            .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string());

        let studio_name = vars
            .get("STUDIO_NAME")
            .cloned()
            .unwrap_or_else(|| DEFAULT_STUDIO_NAME.to_string());

        let smtp_port = parse_positive(
            vars,
            "SMTP_PORT",
            DEFAULT_SMTP_PORT,
            ConfigError::InvalidSmtp,
        )?;

        let non_empty = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();
        let smtp = match (
            non_empty("SMTP_HOST"),
            non_empty("SMTP_USER"),
            non_empty("SMTP_PASS"),
        ) {
            (Some(host), Some(username), Some(password)) => Some(SmtpConfig {
                host,
                port: smtp_port,
                username,
                password: SecretString::from(password),
            }),
            _ => None,
        };

        Ok(Config {
            store_backend,
            database_url,
            bind_address,
            default_timezone,
            db_max_connections,
            db_statement_timeout_seconds,
            seed_on_startup,
            bcrypt_cost,
            mail_from,
            studio_name,
            smtp,
        })
    }
}

/// Parse an optional positive integer variable.
fn parse_positive<T>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
    err: fn(String) -> ConfigError,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: fmt::Display,
{
    let Some(value_str) = vars.get(key) else {
        return Ok(default);
    };

    let value: T = value_str.parse().map_err(|e| {
        err(format!(
            "{} must be a valid positive integer, got '{}': {}",
            key, value_str, e
        ))
    })?;

    if value <= T::default() {
        return Err(err(format!("{} must be greater than 0", key)));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "DATABASE_URL".to_string(),
            "postgresql://localhost/booking_test".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgresql://localhost/booking_test")
        );
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.default_timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_statement_timeout_seconds, 5);
        assert!(config.seed_on_startup);
        assert_eq!(config.bcrypt_cost, DEFAULT_BCRYPT_COST);
        assert_eq!(config.mail_from, "no-reply@fitness.local");
        assert_eq!(config.studio_name, "Raagavi Fitness Studio");
        assert!(config.smtp.is_none());
    }

    #[test]
    fn test_missing_database_url_for_postgres() {
        let result = Config::from_vars(&HashMap::new());
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "DATABASE_URL")
        );
    }

    #[test]
    fn test_memory_backend_without_database_url() {
        let vars = HashMap::from([("STORE_BACKEND".to_string(), "memory".to_string())]);
        let config = Config::from_vars(&vars).expect("memory backend needs no database");

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_invalid_store_backend() {
        let mut vars = base_vars();
        vars.insert("STORE_BACKEND".to_string(), "sqlite".to_string());

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidStoreBackend(_))
        ));
    }

    #[test]
    fn test_custom_timezone() {
        let mut vars = base_vars();
        vars.insert("DEFAULT_TIMEZONE".to_string(), "Europe/London".to_string());

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.default_timezone, chrono_tz::Europe::London);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let mut vars = base_vars();
        vars.insert("DEFAULT_TIMEZONE".to_string(), "Mars/Olympus".to_string());

        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_pool_settings_must_be_positive() {
        let mut vars = base_vars();
        vars.insert("DB_MAX_CONNECTIONS".to_string(), "0".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidPool(_))
        ));

        let mut vars = base_vars();
        vars.insert("DB_STATEMENT_TIMEOUT_SECONDS".to_string(), "abc".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidPool(_))
        ));
    }

    #[test]
    fn test_seed_on_startup_parsing() {
        let mut vars = base_vars();
        vars.insert("SEED_ON_STARTUP".to_string(), "false".to_string());
        assert!(!Config::from_vars(&vars).unwrap().seed_on_startup);

        vars.insert("SEED_ON_STARTUP".to_string(), "TRUE".to_string());
        assert!(Config::from_vars(&vars).unwrap().seed_on_startup);

        vars.insert("SEED_ON_STARTUP".to_string(), "maybe".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidBool(_))
        ));
    }

    #[test]
    fn test_bcrypt_cost_range() {
        let mut vars = base_vars();
        vars.insert("BCRYPT_COST".to_string(), "10".to_string());
        assert_eq!(Config::from_vars(&vars).unwrap().bcrypt_cost, 10);

        vars.insert("BCRYPT_COST".to_string(), "4".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidBcryptCost(_))
        ));

        vars.insert("BCRYPT_COST".to_string(), "15".to_string());
        assert!(Config::from_vars(&vars).is_err());
    }

    #[test]
    fn test_smtp_enabled_only_with_host_user_and_password() {
        let mut vars = base_vars();
        vars.insert("SMTP_HOST".to_string(), "smtp.example.com".to_string());
        vars.insert("SMTP_USER".to_string(), "mailer".to_string());
        assert!(Config::from_vars(&vars).unwrap().smtp.is_none());

        vars.insert("SMTP_PASS".to_string(), "hunter22".to_string());
        vars.insert("SMTP_PORT".to_string(), "2525".to_string());
        let smtp = Config::from_vars(&vars).unwrap().smtp.expect("smtp enabled");
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.username, "mailer");
        assert_eq!(smtp.password.expose_secret(), "hunter22");
    }

    #[test]
    fn test_invalid_smtp_port() {
        let mut vars = base_vars();
        vars.insert("SMTP_PORT".to_string(), "70000".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidSmtp(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut vars = base_vars();
        vars.insert("SMTP_HOST".to_string(), "smtp.example.com".to_string());
        vars.insert("SMTP_USER".to_string(), "mailer".to_string());
        vars.insert("SMTP_PASS".to_string(), "hunter22".to_string());

        let debug = format!("{:?}", Config::from_vars(&vars).unwrap());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("postgresql://localhost/booking_test"));
        assert!(!debug.contains("hunter22"));
    }
}
