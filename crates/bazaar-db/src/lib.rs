//! # bazaar-db: Database Layer for Bazaar
//!
//! Typed PostgreSQL access for users, products, orders and their lines.
//! Built on sqlx with a bounded connection pool.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  Caller (seed / explore binaries, services)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bazaar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (user, order, │    │  (embedded)  │  │   │
//! │  │   │               │    │   product)    │    │              │  │   │
//! │  │   │ PgPool        │    │ UserRepo      │    │ create_      │  │   │
//! │  │   │ Readiness     │◄───│ ProductRepo   │    │   schema     │  │   │
//! │  │   │ UnitOfWork    │    │ OrderRepo     │    │   .up/.down  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     PostgreSQL                                  │   │
//! │  │   users · products · orders · order_products                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Connection settings from the environment
//! - [`pool`] - Connection pool creation, readiness gate
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (user, product, order)
//! - [`unit_of_work`] - Transaction-scoped writes
//! - [`seed`] - Deterministic sample data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_db::{Database, DbConfig, ReadinessPolicy};
//!
//! let config = DbConfig::from_env()?;
//! let db = Database::wait_until_ready(config, ReadinessPolicy::default()).await?;
//!
//! let user = db.users().upsert(&NewUser::new(1, "John Doe", "en")).await?;
//! let orders = db.orders().count_for_user(user.telegram_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DbConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, ReadinessPolicy};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
