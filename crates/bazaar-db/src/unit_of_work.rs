//! # Unit of Work
//!
//! Groups several writes into one transaction.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Transaction Scope                                │
//! │                                                                         │
//! │  db.begin() ──► UnitOfWork (holds one pooled connection)               │
//! │                     │                                                   │
//! │                     ├── upsert_user / create_product / create_order    │
//! │                     ├── link_product / get_user                        │
//! │                     │        (reads see this transaction's writes)     │
//! │                     ▼                                                   │
//! │              ┌──────┴──────┐                                           │
//! │          commit()      rollback() / drop                               │
//! │              │              │                                           │
//! │     all writes visible   none visible                                  │
//! │                                                                         │
//! │  Dropping a UnitOfWork without commit rolls back. A failed statement   │
//! │  aborts the transaction: later statements fail until rollback.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use sqlx::{Postgres, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{order, product, user};
use bazaar_core::{NewProduct, NewUser, Order, OrderProduct, Product, User};

/// An open transaction exposing the write operations of every repository.
///
/// Obtained from [`Database::begin`](crate::Database::begin).
pub struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork").finish_non_exhaustive()
    }
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Postgres>) -> Self {
        UnitOfWork { tx }
    }

    /// See [`UserRepository::upsert`](crate::UserRepository::upsert).
    pub async fn upsert_user(&mut self, new_user: &NewUser) -> DbResult<User> {
        user::upsert(&mut *self.tx, new_user).await
    }

    /// See [`UserRepository::get_by_id`](crate::UserRepository::get_by_id).
    pub async fn get_user(&mut self, telegram_id: i64) -> DbResult<Option<User>> {
        user::get_by_id(&mut *self.tx, telegram_id).await
    }

    /// See [`ProductRepository::create`](crate::ProductRepository::create).
    pub async fn create_product(&mut self, new_product: &NewProduct) -> DbResult<Product> {
        product::create(&mut *self.tx, new_product).await
    }

    /// See [`OrderRepository::create`](crate::OrderRepository::create).
    pub async fn create_order(&mut self, user_id: i64) -> DbResult<Order> {
        order::create(&mut *self.tx, user_id).await
    }

    /// See [`OrderRepository::link_product`](crate::OrderRepository::link_product).
    pub async fn link_product(
        &mut self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> DbResult<OrderProduct> {
        order::link_product(&mut self.tx, order_id, product_id, quantity).await
    }

    /// Makes every write of this unit visible to other connections.
    pub async fn commit(self) -> DbResult<()> {
        debug!("Committing transaction");
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Discards every write of this unit.
    pub async fn rollback(self) -> DbResult<()> {
        debug!("Rolling back transaction");
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}
