//! # Database Configuration
//!
//! Pool settings for the catalog database, built in code or loaded from
//! environment variables.
//!
//! ## Environment Variables
//! | Variable                        | Default        |
//! |---------------------------------|----------------|
//! | `CATALOG_DB_PATH`               | `./catalog.db` |
//! | `CATALOG_DB_MAX_CONNECTIONS`    | `5`            |
//! | `CATALOG_DB_MIN_CONNECTIONS`    | `1`            |
//! | `CATALOG_DB_IDLE_TIMEOUT_SECS`  | `600`          |
//! | `CATALOG_DB_MAX_LIFETIME_SECS`  | `1800`         |
//! | `CATALOG_DB_BUSY_TIMEOUT_MS`    | `5000`         |
//!
//! The pool is owned by the surrounding process; repositories only ever
//! receive a handle to it and never resize it.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/catalog.db")
///     .max_connections(10)
///     .max_lifetime(Duration::from_secs(900));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    pub max_connections: u32,

    /// Minimum number of idle connections kept open.
    pub min_connections: u32,

    /// How long to wait for a free connection.
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    pub idle_timeout: Duration,

    /// Maximum lifetime of any single connection.
    pub max_lifetime: Duration,

    /// How long a connection waits on another connection's write lock
    /// before the statement fails with `DbError::Busy`.
    pub busy_timeout: Duration,

    /// Whether to run migrations on connect.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Loads configuration from `CATALOG_DB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var("CATALOG_DB_PATH").unwrap_or_else(|_| "./catalog.db".to_string());

        let mut config = DbConfig::new(path);
        config.max_connections = env_or("CATALOG_DB_MAX_CONNECTIONS", config.max_connections)?;
        config.min_connections = env_or("CATALOG_DB_MIN_CONNECTIONS", config.min_connections)?;
        config.idle_timeout = Duration::from_secs(env_or("CATALOG_DB_IDLE_TIMEOUT_SECS", 600)?);
        config.max_lifetime = Duration::from_secs(env_or("CATALOG_DB_MAX_LIFETIME_SECS", 1800)?);
        config.busy_timeout = Duration::from_millis(env_or("CATALOG_DB_BUSY_TIMEOUT_MS", 5000)?);

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "CATALOG_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.min_connections > config.max_connections {
            return Err(ConfigError::InvalidValue(
                "CATALOG_DB_MIN_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the idle timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets the maximum connection lifetime.
    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Sets the busy timeout.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            max_lifetime: Duration::from_secs(3600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2)
            .max_lifetime(Duration::from_secs(60))
            .busy_timeout(Duration::from_millis(250))
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_lifetime, Duration::from_secs(60));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_in_memory_uses_single_connection() {
        let config = DbConfig::in_memory();
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.database_path, PathBuf::from(":memory:"));
    }

    #[test]
    fn test_env_or_parses_and_rejects() {
        // Variable names are unique to this test so parallel tests don't race.
        env::set_var("CATALOG_TEST_ENV_OR_OK", " 42 ");
        env::set_var("CATALOG_TEST_ENV_OR_BAD", "lots");

        assert_eq!(env_or::<u32>("CATALOG_TEST_ENV_OR_OK", 1).unwrap(), 42);
        assert_eq!(env_or::<u32>("CATALOG_TEST_ENV_OR_MISSING", 7).unwrap(), 7);
        assert!(matches!(
            env_or::<u32>("CATALOG_TEST_ENV_OR_BAD", 1),
            Err(ConfigError::InvalidValue(name)) if name == "CATALOG_TEST_ENV_OR_BAD"
        ));
    }
}
