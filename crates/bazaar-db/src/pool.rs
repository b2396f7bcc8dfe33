//! # Database Pool Management
//!
//! Connection pool creation, readiness gating and disposal for PostgreSQL.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  Startup                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::from_env() ← discrete settings (user, host, db, ...)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::wait_until_ready(config, policy)                            │
//! │       │   retry connect every `interval`, at most `max_attempts`       │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │               PgPool                     │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐   ┌ ─ ─ ┐      │  pool_size kept warm     │
//! │  │  │Conn1│ │Conn2│ │Conn3│ … │burst│      │  + max_overflow burst    │
//! │  │  └─────┘ └─────┘ └─────┘   └ ─ ─ ┘      │  pinged before handout   │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository call ──► acquire ──► one statement ──► release             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use crate::repository::user::UserRepository;
use crate::unit_of_work::UnitOfWork;

// =============================================================================
// Readiness
// =============================================================================

/// How long to keep polling for a database that is still starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Fixed delay between attempts.
    /// Default: 2 seconds
    pub interval: Duration,

    /// Give up after this many attempts. `None` polls forever.
    /// Default: 30
    pub max_attempts: Option<u32>,
}

impl ReadinessPolicy {
    /// Polls forever at the given interval.
    pub fn unbounded(interval: Duration) -> Self {
        ReadinessPolicy {
            interval,
            max_attempts: None,
        }
    }

    /// Sets the attempt bound.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Returns true once `attempt` (1-based) has used up the budget.
    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        ReadinessPolicy {
            interval: Duration::from_secs(2),
            max_attempts: Some(30),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cheap to clone: clones share the same pool.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::connect(DbConfig::from_env()?).await?;
///
/// let user = db.users().upsert(&NewUser::new(1, "John Doe", "en")).await?;
/// let order = db.orders().create(user.telegram_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Builds connect options from the discrete config fields
    /// 2. Creates a pool bounded to `pool_size + max_overflow` connections,
    ///    keeping `pool_size` open and pinging connections before use
    /// 3. Runs migrations (if enabled)
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError::ConnectionFailed)` - Server unreachable
    /// * `Err(DbError::MigrationFailed)` - Schema could not be applied
    pub async fn connect(config: DbConfig) -> DbResult<Self> {
        config.validate()?;
        info!(url = %config.display_url(), "Initializing database connection");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .test_before_acquire(config.pre_ping)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            pool_size = config.pool_size,
            max_overflow = config.max_overflow,
            pre_ping = config.pre_ping,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Polls until the server accepts a connection, then connects.
    ///
    /// ## Behavior
    /// - Connection failures are retried after `policy.interval`
    /// - Any other failure (e.g. a broken migration) is returned at once
    /// - Exhausting `policy.max_attempts` returns `DbError::ConnectionFailed`
    pub async fn wait_until_ready(config: DbConfig, policy: ReadinessPolicy) -> DbResult<Self> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match Database::connect(config.clone()).await {
                Ok(db) => {
                    info!(attempt, "Postgres ready");
                    return Ok(db);
                }
                Err(DbError::ConnectionFailed(reason)) => {
                    if policy.exhausted(attempt) {
                        return Err(DbError::ConnectionFailed(format!(
                            "gave up after {} attempts: {}",
                            attempt, reason
                        )));
                    }
                    warn!(attempt, %reason, "Waiting for Postgres to start...");
                    tokio::time::sleep(policy.interval).await;
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Wraps an existing pool (e.g. one provisioned by `#[sqlx::test]`).
    pub fn from_pool(pool: PgPool) -> Self {
        Database { pool }
    }

    /// Runs database migrations.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Drops and recreates every table.
    pub async fn reset(&self) -> DbResult<()> {
        migrations::reset(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    ///
    /// Prefer repository methods when available.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    /// Returns the product repository.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    /// Returns the order repository.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Starts a transaction for multi-step writes.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let mut tx = db.begin().await?;
    /// let order = tx.create_order(user_id).await?;
    /// tx.link_product(order.order_id, product_id, 2).await?;
    /// tx.commit().await?;
    /// ```
    pub async fn begin(&self) -> DbResult<UnitOfWork> {
        debug!("Beginning transaction");
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(UnitOfWork::new(tx))
    }

    /// Closes the database connection pool, releasing every connection.
    ///
    /// ## Note
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_default_policy_is_bounded() {
        let policy = ReadinessPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert!(!policy.exhausted(29));
        assert!(policy.exhausted(30));
    }

    #[test]
    fn test_unbounded_policy_never_exhausts() {
        let policy = ReadinessPolicy::unbounded(Duration::from_millis(10));
        assert!(!policy.exhausted(u32::MAX));
        assert!(policy.max_attempts(3).exhausted(3));
    }

    #[tokio::test]
    async fn test_wait_gives_up_when_unreachable() {
        // Nothing listens on port 1; every attempt fails fast.
        let config = DbConfig::new("postgres", "postgres", "127.0.0.1", "postgres")
            .port(1)
            .acquire_timeout(Duration::from_millis(200));
        let policy = ReadinessPolicy::unbounded(Duration::from_millis(10)).max_attempts(2);

        let err = Database::wait_until_ready(config, policy).await.unwrap_err();
        match err {
            DbError::ConnectionFailed(reason) => assert!(reason.contains("2 attempts")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_pool() {
        // Rejected before any socket is opened, so the port does not matter.
        let config = DbConfig::new("postgres", "postgres", "127.0.0.1", "postgres")
            .port(1)
            .pool_size(0);

        let err = Database::connect(config.clone()).await.unwrap_err();
        assert!(matches!(err, DbError::Config(ConfigError::InvalidValue { .. })));

        // Not a connection failure, so waiting does not retry it.
        let policy = ReadinessPolicy::unbounded(Duration::from_millis(10)).max_attempts(5);
        let err = Database::wait_until_ready(config, policy).await.unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }
}
