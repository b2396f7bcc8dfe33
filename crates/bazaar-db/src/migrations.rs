//! # Database Migrations
//!
//! Embedded, reversible SQL migrations for Bazaar.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Startup                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table                                          │
//! │       │                                                                 │
//! │       ├── Table doesn't exist? Create it                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       └── *_create_schema.up.sql  (users, products, orders, ...)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record in _sqlx_migrations           │
//! │                                                                         │
//! │  reset(): run every *.down.sql (newest first), then migrate again      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Add a `<timestamp>_<description>.up.sql` / `.down.sql` pair to
//!    `migrations/postgres/`
//! 2. Guard DDL with `IF NOT EXISTS` / `IF EXISTS`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::DbResult;

/// SQLSTATE `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

/// Embedded migrations from the `migrations/postgres` directory.
///
/// Also used by `#[sqlx::test(migrator = "bazaar_db::migrations::MIGRATOR")]`
/// to provision test databases.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Runs all pending database migrations.
///
/// Idempotent: safe to run multiple times.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Drops the schema by reverting every migration, then re-applies them.
///
/// ## Warning
/// Deletes all rows. Used by `seed --reset`.
pub async fn reset(pool: &PgPool) -> DbResult<()> {
    warn!("Reverting all migrations (dropping tables)");
    MIGRATOR.undo(pool, 0).await?;

    run_migrations(pool).await
}

/// Returns information about migrations.
///
/// ## Returns
/// Tuple of (total_migrations, applied_migrations)
pub async fn migration_status(pool: &PgPool) -> DbResult<(usize, usize)> {
    // Reversible migrations embed both halves; count each pair once.
    let total = MIGRATOR
        .migrations
        .iter()
        .filter(|m| m.migration_type.is_up_migration())
        .count();

    let applied: i64 =
        match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await
        {
            Ok(count) => count,
            // Before the first run the bookkeeping table doesn't exist yet.
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNDEFINED_TABLE) => 0,
            Err(e) => return Err(e.into()),
        };

    Ok((total, applied as usize))
}
