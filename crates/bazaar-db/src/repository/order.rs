//! # Order Repository
//!
//! Database operations for orders and their product lines.
//!
//! ## Data Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Structure                                  │
//! │                                                                         │
//! │  users ──< orders ──< order_products >── products                      │
//! │   (user_id: SET NULL)  (order_id: CASCADE)  (product_id: CASCADE)      │
//! │                                                                         │
//! │  order_products is keyed by (order_id, product_id): a product appears  │
//! │  at most once per order, with a positive quantity.                     │
//! │                                                                         │
//! │  Reads                                                                 │
//! │  ├── lines_for_user     user ⋈ orders ⋈ order_products ⋈ products      │
//! │  ├── count_for_user     COUNT(orders) for one user                     │
//! │  ├── count_per_user     COUNT(orders) GROUP BY user                    │
//! │  └── quantity_per_user  SUM(quantity) GROUP BY user HAVING > min       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use bazaar_core::{
    validation, Order, OrderLine, OrderProduct, Product, Table, Timestamps, User,
    UserOrderCount, UserQuantityTotal,
};

/// Repository for order database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.orders();
///
/// let order = repo.create(user.telegram_id).await?;
/// repo.link_product(order.order_id, product.product_id, 3).await?;
///
/// for line in repo.lines_for_user(user.telegram_id).await? {
///     println!("{} x{}", line.product.title, line.order_product.quantity);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: PgPool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an empty order owned by `user_id`.
    ///
    /// ## Returns
    /// * `Ok(Order)` - The new order with its server-assigned id
    /// * `Err(DbError::ForeignKeyViolation)` - `user_id` is not a user
    pub async fn create(&self, user_id: i64) -> DbResult<Order> {
        create(&self.pool, user_id).await
    }

    /// Adds a product to an order. Idempotent on `(order_id, product_id)`.
    ///
    /// If the pair is already linked, the stored row is returned untouched
    /// (its original quantity wins).
    pub async fn link_product(
        &self,
        order_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> DbResult<OrderProduct> {
        let mut conn = self.pool.acquire().await?;
        link_product(&mut conn, order_id, product_id, quantity).await
    }

    /// Gets an order by its id.
    pub async fn get_by_id(&self, order_id: i32) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT order_id, user_id, created_at, updated_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets a single order line.
    pub async fn get_line(&self, order_id: i32, product_id: i32) -> DbResult<Option<OrderProduct>> {
        get_line(&self.pool, order_id, product_id).await
    }

    /// Every product line of every order owned by `user_id`, each with its
    /// product, order and user. Ordered by order id, then product id.
    ///
    /// Inner joins throughout: orders without lines contribute nothing.
    pub async fn lines_for_user(&self, user_id: i64) -> DbResult<Vec<OrderLine>> {
        debug!(user_id, "Loading order lines");

        let rows = sqlx::query_as::<_, OrderLineRow>(
            r#"
            SELECT
                p.product_id,
                p.title,
                p.description,
                p.price,
                p.created_at  AS product_created_at,
                p.updated_at  AS product_updated_at,
                o.order_id,
                o.user_id     AS order_user_id,
                o.created_at  AS order_created_at,
                o.updated_at  AS order_updated_at,
                u.telegram_id,
                u.full_name,
                u.user_name,
                u.language_code,
                u.referred_id,
                u.created_at  AS user_created_at,
                u.updated_at  AS user_updated_at,
                op.quantity
            FROM users u
            INNER JOIN orders o          ON o.user_id = u.telegram_id
            INNER JOIN order_products op ON op.order_id = o.order_id
            INNER JOIN products p        ON p.product_id = op.product_id
            WHERE u.telegram_id = $1
            ORDER BY o.order_id, p.product_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(user_id, count = rows.len(), "Loaded order lines");
        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    /// Number of orders owned by `user_id`. Unknown users count 0.
    pub async fn count_for_user(&self, user_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Order count for every user owning at least one order.
    ///
    /// Ordered by count descending, then Telegram id.
    pub async fn count_per_user(&self) -> DbResult<Vec<UserOrderCount>> {
        let counts = sqlx::query_as::<_, UserOrderCount>(
            r#"
            SELECT
                u.telegram_id,
                u.full_name,
                u.user_name,
                COUNT(o.order_id) AS order_count
            FROM orders o
            INNER JOIN users u ON u.telegram_id = o.user_id
            GROUP BY u.telegram_id
            ORDER BY order_count DESC, u.telegram_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Total quantity ordered per user, keeping only users whose total is
    /// strictly greater than `min_total`.
    ///
    /// Ordered by total descending, then Telegram id.
    pub async fn quantity_per_user(&self, min_total: i64) -> DbResult<Vec<UserQuantityTotal>> {
        debug!(min_total, "Summing quantities per user");

        let totals = sqlx::query_as::<_, UserQuantityTotal>(
            r#"
            SELECT
                u.telegram_id,
                u.full_name,
                u.user_name,
                SUM(op.quantity)::BIGINT AS total_quantity
            FROM order_products op
            INNER JOIN orders o ON o.order_id = op.order_id
            INNER JOIN users u  ON u.telegram_id = o.user_id
            GROUP BY u.telegram_id
            HAVING SUM(op.quantity) > $1
            ORDER BY total_quantity DESC, u.telegram_id
            "#,
        )
        .bind(min_total)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Deletes an order and its lines. Products are untouched.
    pub async fn delete(&self, order_id: i32) -> DbResult<bool> {
        debug!(order_id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts orders.
    pub async fn count(&self) -> DbResult<i64> {
        super::count_rows::<Order>(&self.pool).await
    }
}

// =============================================================================
// Statements shared with UnitOfWork
// =============================================================================

pub(crate) async fn create<'e, E>(executor: E, user_id: i64) -> DbResult<Order>
where
    E: PgExecutor<'e>,
{
    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (user_id)
        VALUES ($1)
        RETURNING order_id, user_id, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    info!(order_id = order.order_id, user_id, "Order created");
    Ok(order)
}

pub(crate) async fn get_line<'e, E>(
    executor: E,
    order_id: i32,
    product_id: i32,
) -> DbResult<Option<OrderProduct>>
where
    E: PgExecutor<'e>,
{
    let line = sqlx::query_as::<_, OrderProduct>(
        r#"
        SELECT order_id, product_id, quantity
        FROM order_products
        WHERE order_id = $1 AND product_id = $2
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .fetch_optional(executor)
    .await?;

    Ok(line)
}

/// Insert-or-return-existing for an order line.
///
/// The CTE covers the common case in one round trip. When a concurrent
/// transaction inserts the same pair between our snapshot and our insert,
/// neither branch sees a row; the follow-up read picks up the winner.
pub(crate) async fn link_product(
    conn: &mut PgConnection,
    order_id: i32,
    product_id: i32,
    quantity: i32,
) -> DbResult<OrderProduct> {
    validation::validate_quantity(quantity)?;

    debug!(order_id, product_id, quantity, "Linking product to order");

    let line = sqlx::query_as::<_, OrderProduct>(
        r#"
        WITH inserted AS (
            INSERT INTO order_products (order_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (order_id, product_id) DO NOTHING
            RETURNING order_id, product_id, quantity
        )
        SELECT order_id, product_id, quantity FROM inserted
        UNION ALL
        SELECT order_id, product_id, quantity
        FROM order_products
        WHERE order_id = $1 AND product_id = $2
        LIMIT 1
        "#,
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut *conn)
    .await?;

    match line {
        Some(line) => Ok(line),
        None => get_line(&mut *conn, order_id, product_id)
            .await?
            .ok_or_else(|| {
                DbError::not_found(OrderProduct::TABLE, format!("{order_id}/{product_id}"))
            }),
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row produced by the four-way join in `lines_for_user`.
///
/// Column names that collide across tables are aliased with the table prefix.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    product_id: i32,
    title: String,
    description: Option<String>,
    price: Decimal,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
    order_id: i32,
    order_user_id: Option<i64>,
    order_created_at: DateTime<Utc>,
    order_updated_at: DateTime<Utc>,
    telegram_id: i64,
    full_name: String,
    user_name: Option<String>,
    language_code: String,
    referred_id: Option<i64>,
    user_created_at: DateTime<Utc>,
    user_updated_at: DateTime<Utc>,
    quantity: i32,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            product: Product {
                product_id: row.product_id,
                title: row.title,
                description: row.description,
                price: row.price,
                timestamps: Timestamps {
                    created_at: row.product_created_at,
                    updated_at: row.product_updated_at,
                },
            },
            order: Order {
                order_id: row.order_id,
                user_id: row.order_user_id,
                timestamps: Timestamps {
                    created_at: row.order_created_at,
                    updated_at: row.order_updated_at,
                },
            },
            user: User {
                telegram_id: row.telegram_id,
                full_name: row.full_name,
                user_name: row.user_name,
                language_code: row.language_code,
                referred_id: row.referred_id,
                timestamps: Timestamps {
                    created_at: row.user_created_at,
                    updated_at: row.user_updated_at,
                },
            },
            order_product: OrderProduct {
                order_id: row.order_id,
                product_id: row.product_id,
                quantity: row.quantity,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_row_maps_into_every_entity() {
        let now = Utc::now();
        let row = OrderLineRow {
            product_id: 7,
            title: "Tea".to_string(),
            description: None,
            price: Decimal::from_str("3.50").unwrap(),
            product_created_at: now,
            product_updated_at: now,
            order_id: 3,
            order_user_id: Some(42),
            order_created_at: now,
            order_updated_at: now,
            telegram_id: 42,
            full_name: "John Doe".to_string(),
            user_name: Some("john".to_string()),
            language_code: "en".to_string(),
            referred_id: None,
            user_created_at: now,
            user_updated_at: now,
            quantity: 5,
        };

        let line = OrderLine::from(row);

        assert_eq!(line.product.product_id, 7);
        assert_eq!(line.order.order_id, 3);
        assert_eq!(line.order.user_id, Some(line.user.telegram_id));
        assert_eq!(
            line.order_product,
            OrderProduct {
                order_id: 3,
                product_id: 7,
                quantity: 5
            }
        );
    }
}
