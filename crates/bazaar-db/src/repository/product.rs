//! # Product Repository
//!
//! Database operations for products.

use sqlx::{PgExecutor, PgPool};
use tracing::debug;

use crate::error::DbResult;
use bazaar_core::{validation, NewProduct, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: PgPool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and returns it with its server-assigned id and
    /// timestamps.
    pub async fn create(&self, product: &NewProduct) -> DbResult<Product> {
        create(&self.pool, product).await
    }

    /// Gets a product by its id.
    pub async fn get_by_id(&self, product_id: i32) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, title, description, price, created_at, updated_at
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Deletes a product. Its order lines go with it.
    pub async fn delete(&self, product_id: i32) -> DbResult<bool> {
        debug!(product_id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts products.
    pub async fn count(&self) -> DbResult<i64> {
        super::count_rows::<Product>(&self.pool).await
    }
}

pub(crate) async fn create<'e, E>(executor: E, product: &NewProduct) -> DbResult<Product>
where
    E: PgExecutor<'e>,
{
    validation::validate_new_product(product)?;

    debug!(title = %product.title, price = %product.price, "Creating product");

    let row = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (title, description, price)
        VALUES ($1, $2, $3)
        RETURNING product_id, title, description, price, created_at, updated_at
        "#,
    )
    .bind(&product.title)
    .bind(&product.description)
    .bind(product.price)
    .fetch_one(executor)
    .await?;

    Ok(row)
}
