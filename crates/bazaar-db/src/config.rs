//! # Connection Settings
//!
//! Builds a connection target from discrete fields rather than a URL string.
//!
//! ## Environment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Variable               Required   Default                              │
//! │  ─────────────────────  ────────   ───────                              │
//! │  POSTGRES_USER          yes                                             │
//! │  POSTGRES_PASSWORD      yes                                             │
//! │  DATABASE_HOST          yes                                             │
//! │  POSTGRES_DB            yes                                             │
//! │  DATABASE_PORT          no         5432                                 │
//! │  DATABASE_DRIVER        no         postgres                             │
//! │  DATABASE_POOL_SIZE     no         20                                   │
//! │  DATABASE_MAX_OVERFLOW  no         0                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `.env` file in the working directory is loaded first, if present.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

/// Default Postgres port.
pub const DEFAULT_PORT: u16 = 5432;

/// Default number of persistent pooled connections.
pub const DEFAULT_POOL_SIZE: u32 = 20;

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),
}

// =============================================================================
// Driver
// =============================================================================

/// The client driver variant for the connection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// `postgres://` / `postgresql://`
    Postgres,
}

impl Driver {
    pub fn scheme(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
        }
    }
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            other => Err(ConfigError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("postgres", "secret", "127.0.0.1", "postgres")
///     .pool_size(5)
///     .max_overflow(2);
/// let db = Database::connect(config).await?;
/// ```
#[derive(Clone)]
pub struct DbConfig {
    pub driver: Driver,
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,

    /// Connections kept open in the pool.
    /// Default: 20
    pub pool_size: u32,

    /// Extra connections allowed above `pool_size` under burst load.
    /// Default: 0
    pub max_overflow: u32,

    /// Check that a pooled connection is alive before handing it out.
    /// Default: true
    pub pre_ping: bool,

    /// How long a caller waits for a free connection.
    /// Default: 30 seconds
    pub acquire_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration with the required fields and default pool
    /// settings.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        DbConfig {
            driver: Driver::Postgres,
            username: username.into(),
            password: password.into(),
            host: host.into(),
            port: DEFAULT_PORT,
            database: database.into(),
            pool_size: DEFAULT_POOL_SIZE,
            max_overflow: 0,
            pre_ping: true,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// Loads configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; the variables may come from the shell.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingRequired(key.to_string()));

        let mut config = DbConfig::new(
            required("POSTGRES_USER")?,
            required("POSTGRES_PASSWORD")?,
            required("DATABASE_HOST")?,
            required("POSTGRES_DB")?,
        );

        if let Some(driver) = get("DATABASE_DRIVER") {
            config.driver = driver.parse()?;
        }
        if let Some(port) = get("DATABASE_PORT") {
            config.port = parse_value("DATABASE_PORT", &port)?;
        }
        if let Some(size) = get("DATABASE_POOL_SIZE") {
            config.pool_size = parse_value("DATABASE_POOL_SIZE", &size)?;
        }
        if let Some(overflow) = get("DATABASE_MAX_OVERFLOW") {
            config.max_overflow = parse_value("DATABASE_MAX_OVERFLOW", &overflow)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that a pool can be built from these settings.
    ///
    /// At least one connection must be allowed: `pool_size` may be zero
    /// only when `max_overflow` makes up for it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections() == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_POOL_SIZE".to_string(),
                value: self.pool_size.to_string(),
            });
        }
        Ok(())
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the number of persistent connections.
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Sets the burst allowance above `pool_size`.
    pub fn max_overflow(mut self, overflow: u32) -> Self {
        self.max_overflow = overflow;
        self
    }

    /// Sets whether connections are pinged before use.
    pub fn pre_ping(mut self, enabled: bool) -> Self {
        self.pre_ping = enabled;
        self
    }

    /// Sets the acquire timeout.
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Upper bound on open connections: `pool_size + max_overflow`.
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }

    /// Builds sqlx connect options from the discrete fields.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }

    /// Renders the connection target with the password masked, for logs.
    pub fn display_url(&self) -> String {
        format!(
            "{}://{}:***@{}:{}/{}",
            self.driver.scheme(),
            self.username,
            self.host,
            self.port,
            self.database
        )
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.display_url())
            .field("pool_size", &self.pool_size)
            .field("max_overflow", &self.max_overflow)
            .field("pre_ping", &self.pre_ping)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("POSTGRES_USER", "postgres"),
        ("POSTGRES_PASSWORD", "testpassword"),
        ("DATABASE_HOST", "127.0.0.1"),
        ("POSTGRES_DB", "postgres"),
    ];

    #[test]
    fn test_required_fields_with_defaults() {
        let config = DbConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.driver, Driver::Postgres);
        assert_eq!(config.port, 5432);
        assert_eq!(config.pool_size, 20);
        assert_eq!(config.max_overflow, 0);
        assert!(config.pre_ping);
        assert_eq!(config.max_connections(), 20);
    }

    #[test]
    fn test_missing_required_field() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "DATABASE_HOST")
            .collect();
        let err = DbConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref k) if k == "DATABASE_HOST"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = REQUIRED.to_vec();
        vars[1] = ("POSTGRES_PASSWORD", "  ");
        let err = DbConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("DATABASE_PORT", "6543"));
        vars.push(("DATABASE_POOL_SIZE", "5"));
        vars.push(("DATABASE_MAX_OVERFLOW", "3"));
        vars.push(("DATABASE_DRIVER", "postgresql"));
        let config = DbConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 6543);
        assert_eq!(config.max_connections(), 8);
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("DATABASE_PORT", "not-a-port"));
        assert!(matches!(
            DbConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("DATABASE_DRIVER", "mysql"));
        assert!(matches!(
            DbConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::UnsupportedDriver(_)
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("DATABASE_POOL_SIZE", "0"));
        assert!(DbConfig::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn test_pool_needs_one_connection() {
        let config = DbConfig::new("postgres", "testpassword", "db", "shop").pool_size(0);
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidValue { ref key, ref value } if key == "DATABASE_POOL_SIZE" && value == "0"
        ));

        let config = config.max_overflow(2);
        config.validate().unwrap();
        assert_eq!(config.max_connections(), 2);

        let mut vars = REQUIRED.to_vec();
        vars.push(("DATABASE_POOL_SIZE", "0"));
        vars.push(("DATABASE_MAX_OVERFLOW", "4"));
        let config = DbConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.max_connections(), 4);
    }

    #[test]
    fn test_display_url_masks_password() {
        let config = DbConfig::new("postgres", "testpassword", "db", "shop").port(5433);
        assert_eq!(config.display_url(), "postgres://postgres:***@db:5433/shop");
        assert!(!format!("{config:?}").contains("testpassword"));
    }
}
