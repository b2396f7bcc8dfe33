//! # Entity Types
//!
//! Typed table definitions used throughout Bazaar.
//!
//! ## Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Schema Model                                 │
//! │                                                                         │
//! │  ┌──────────────────┐        ┌──────────────────┐                      │
//! │  │      users       │◄───────│      orders      │                      │
//! │  │  ──────────────  │ user_id│  ──────────────  │                      │
//! │  │  telegram_id PK  │ SET    │  order_id PK     │                      │
//! │  │  full_name       │ NULL   │  user_id FK      │                      │
//! │  │  user_name?      │        └────────┬─────────┘                      │
//! │  │  language_code   │                 │ CASCADE                        │
//! │  │  referred_id? ───┼──┐     ┌────────▼─────────┐   ┌────────────────┐ │
//! │  └──────────────────┘  │     │  order_products  │   │    products    │ │
//! │           ▲            │     │  ──────────────  │   │  ────────────  │ │
//! │           └────────────┘     │  order_id  PK,FK │   │  product_id PK │ │
//! │          SET NULL            │  product_id PK,FK├──►│  title         │ │
//! │                              │  quantity        │   │  description?  │ │
//! │                              └──────────────────┘   │  price         │ │
//! │                                         CASCADE     └────────────────┘ │
//! │                                                                         │
//! │  users, orders, products also carry created_at / updated_at            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shared Behavior
//! Instead of inheriting naming and timestamp columns, each entity:
//! - implements [`Table`] with its table name, and
//! - embeds the [`Timestamps`] field set (where the table has one).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Shared Field Sets
// =============================================================================

/// A database table backing an entity.
pub trait Table {
    /// Table name in the database.
    const TABLE: &'static str;
}

/// Server-assigned creation and modification times.
///
/// Both default to `NOW()` on insert; `updated_at` is refreshed by a
/// trigger on every update. Callers never set them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entities that carry a [`Timestamps`] field set.
pub trait Timestamped {
    fn timestamps(&self) -> &Timestamps;

    fn created_at(&self) -> DateTime<Utc> {
        self.timestamps().created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.timestamps().updated_at
    }
}

// =============================================================================
// User
// =============================================================================

/// A bot user, keyed by the externally assigned Telegram id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    /// Primary key, assigned by Telegram (never generated here).
    pub telegram_id: i64,

    pub full_name: String,

    pub user_name: Option<String>,

    /// Short language tag, e.g. `en`.
    pub language_code: String,

    /// The user who referred this one. Cleared if the referrer is deleted.
    pub referred_id: Option<i64>,

    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub timestamps: Timestamps,
}

impl Table for User {
    const TABLE: &'static str = "users";
}

impl Timestamped for User {
    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

/// Input for inserting or updating a user.
///
/// ## Example
/// ```rust
/// use bazaar_core::NewUser;
///
/// let user = NewUser::new(42, "Jane Roe", "fr")
///     .with_user_name("jane")
///     .referred_by(7);
/// assert_eq!(user.referred_id, Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub telegram_id: i64,
    pub full_name: String,
    pub user_name: Option<String>,
    pub language_code: String,
    pub referred_id: Option<i64>,
}

impl NewUser {
    pub fn new(
        telegram_id: i64,
        full_name: impl Into<String>,
        language_code: impl Into<String>,
    ) -> Self {
        NewUser {
            telegram_id,
            full_name: full_name.into(),
            user_name: None,
            language_code: language_code.into(),
            referred_id: None,
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn referred_by(mut self, referrer: i64) -> Self {
        self.referred_id = Some(referrer);
        self
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product that can appear on orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Auto-incremented primary key.
    pub product_id: i32,

    pub title: String,

    pub description: Option<String>,

    /// Fixed-point price, `NUMERIC(16, 4)`.
    pub price: Decimal,

    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub timestamps: Timestamps,
}

impl Table for Product {
    const TABLE: &'static str = "products";
}

impl Timestamped for Product {
    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
}

impl NewProduct {
    pub fn new(title: impl Into<String>, price: Decimal) -> Self {
        NewProduct {
            title: title.into(),
            description: None,
            price,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order placed by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    /// Auto-incremented primary key.
    pub order_id: i32,

    /// Owner. Cleared if the user is deleted; the order itself survives.
    pub user_id: Option<i64>,

    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub timestamps: Timestamps,
}

impl Table for Order {
    const TABLE: &'static str = "orders";
}

impl Timestamped for Order {
    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

// =============================================================================
// Order Product
// =============================================================================

/// One product line of an order.
///
/// This is the join entity between orders and products, not a pure link
/// table: it carries the quantity. `(order_id, product_id)` is the primary
/// key, so a pair exists at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderProduct {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
}

impl Table for OrderProduct {
    const TABLE: &'static str = "order_products";
}

// =============================================================================
// Query Row Shapes
// =============================================================================

/// A denormalized row of a user's orders: one product line of one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: Product,
    pub order: Order,
    pub user: User,
    pub order_product: OrderProduct,
}

/// Number of orders placed by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserOrderCount {
    pub telegram_id: i64,
    pub full_name: String,
    pub user_name: Option<String>,
    pub order_count: i64,
}

/// Total product quantity across all orders of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserQuantityTotal {
    pub telegram_id: i64,
    pub full_name: String,
    pub user_name: Option<String>,
    pub total_quantity: i64,
}

/// A referrer and a user they invited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Referral {
    pub referrer_id: i64,
    pub referrer_name: String,
    pub referral_id: i64,
    pub referral_name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamps() -> Timestamps {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Timestamps {
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_table_names_are_snake_case_plurals() {
        assert_eq!(User::TABLE, "users");
        assert_eq!(Product::TABLE, "products");
        assert_eq!(Order::TABLE, "orders");
        assert_eq!(OrderProduct::TABLE, "order_products");
    }

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new(1, "John Doe", "en").with_user_name("johnny");
        assert_eq!(user.telegram_id, 1);
        assert_eq!(user.user_name.as_deref(), Some("johnny"));
        assert_eq!(user.referred_id, None);
    }

    #[test]
    fn test_new_product_builder() {
        let product = NewProduct::new("Tea", Decimal::new(499, 2)).with_description("Green");
        assert_eq!(product.price.to_string(), "4.99");
        assert_eq!(product.description.as_deref(), Some("Green"));
    }

    #[test]
    fn test_timestamped_accessors() {
        let order = Order {
            order_id: 3,
            user_id: None,
            timestamps: stamps(),
        };
        assert_eq!(order.created_at(), stamps().created_at);
        assert_eq!(order.updated_at(), stamps().updated_at);
    }

    #[test]
    fn test_timestamps_are_flattened_in_json() {
        let user = User {
            telegram_id: 1,
            full_name: "John Doe".to_string(),
            user_name: None,
            language_code: "en".to_string(),
            referred_id: None,
            timestamps: stamps(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("created_at").is_some());
        assert!(json.get("timestamps").is_none());
    }
}
