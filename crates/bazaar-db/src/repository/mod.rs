//! # Repository Module
//!
//! Database repository implementations for Bazaar.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.users().upsert(&new_user)                                  │
//! │       ▼                                                                 │
//! │  UserRepository (owns a PgPool handle)                                 │
//! │       │                                                                 │
//! │       │  user::upsert(&pool, ..)  ◄── same fn ──  UnitOfWork           │
//! │       ▼                                  (&mut transaction)            │
//! │  Executor-generic statement fns                                        │
//! │       │                                                                 │
//! │       │  one SQL statement                                              │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                            │
//! │                                                                         │
//! │  Every statement is written once. Pooled repositories run it on a      │
//! │  connection acquired for that call; UnitOfWork runs it inside its      │
//! │  open transaction.                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Upsert, lookup, filtered listing, referrals
//! - [`ProductRepository`](product::ProductRepository) - Product creation and lookup
//! - [`OrderRepository`](order::OrderRepository) - Orders, product lines, joins and aggregates

pub mod order;
pub mod product;
pub mod user;

use bazaar_core::Table;
use sqlx::PgExecutor;

use crate::error::DbResult;

/// Counts every row in `T`'s table.
pub(crate) async fn count_rows<'e, T: Table>(executor: impl PgExecutor<'e>) -> DbResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(executor).await?;

    Ok(count)
}
