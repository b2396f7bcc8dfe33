//! # Seed Data
//!
//! Deterministic sample data for development and demos.
//!
//! ## Two Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Seeding Pipeline                                │
//! │                                                                         │
//! │  SeedSpec { seed: 0, users: 10, ... }                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SeedPlan::generate  (pure: ChaCha8Rng + fake, no I/O)                 │
//! │       │   users     ids 1000..=9999, user i referred by user i-1       │
//! │       │   products  price 0.99 .. 999.99                               │
//! │       │   orders    owned by their user, lines on distinct products    │
//! │       ▼                                                                 │
//! │  apply(&db, &plan)   users one by one, then one transaction for        │
//! │       │              products, orders and lines (indices → server ids) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SeedReport { users, products, orders, lines }                         │
//! │                                                                         │
//! │  Same seed, same plan. Re-applying upserts the same users and adds     │
//! │  new products and orders alongside the old ones.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use fake::faker::internet::raw::Username;
use fake::faker::lorem::raw::{Sentence, Word};
use fake::faker::name::raw::Name;
use fake::locales::EN;
use fake::Fake;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::pool::Database;
use bazaar_core::{NewProduct, NewUser};

/// Lowest Telegram id handed out to seeded users.
pub const MIN_USER_ID: i64 = 1000;

/// Highest Telegram id handed out to seeded users.
pub const MAX_USER_ID: i64 = 9999;

/// Languages seeded users pick from.
pub const LANGUAGES: &[&str] = &["en", "uk", "fr"];

/// Price bounds in cents.
const MIN_PRICE_CENTS: i64 = 99;
const MAX_PRICE_CENTS: i64 = 99_999;

const MAX_QUANTITY: i32 = 9999;

// =============================================================================
// Shape
// =============================================================================

/// Shape of the data to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSpec {
    /// RNG seed. Same value, same plan.
    pub seed: u64,
    pub users: usize,
    pub orders_per_user: usize,
    pub products_per_user: usize,
    pub lines_per_order: usize,
}

impl Default for SeedSpec {
    fn default() -> Self {
        SeedSpec {
            seed: 0,
            users: 10,
            orders_per_user: 10,
            products_per_user: 10,
            lines_per_order: 3,
        }
    }
}

/// Reasons a seed shape cannot be turned into a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    #[error("cannot seed {requested} users: only {available} distinct ids are available")]
    TooManyUsers { requested: usize, available: usize },

    #[error("orders need {lines_per_order} distinct products but only {products} are planned")]
    NotEnoughProducts {
        lines_per_order: usize,
        products: usize,
    },
}

// =============================================================================
// Plan
// =============================================================================

/// One product line of a planned order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedLine {
    /// Index into [`SeedPlan::products`].
    pub product: usize,
    pub quantity: i32,
}

/// A planned order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOrder {
    /// Index into [`SeedPlan::users`].
    pub user: usize,
    pub lines: Vec<PlannedLine>,
}

/// Everything [`apply`] will write, in write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub users: Vec<NewUser>,
    pub products: Vec<NewProduct>,
    pub orders: Vec<PlannedOrder>,
}

impl SeedPlan {
    /// Generates a plan from `spec`. Pure and deterministic.
    pub fn generate(spec: &SeedSpec) -> Result<SeedPlan, SeedError> {
        let available = (MAX_USER_ID - MIN_USER_ID + 1) as usize;
        if spec.users > available {
            return Err(SeedError::TooManyUsers {
                requested: spec.users,
                available,
            });
        }

        let product_count = spec.users * spec.products_per_user;
        let order_count = spec.users * spec.orders_per_user;
        if order_count > 0 && spec.lines_per_order > product_count {
            return Err(SeedError::NotEnoughProducts {
                lines_per_order: spec.lines_per_order,
                products: product_count,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);

        let ids = index::sample(&mut rng, available, spec.users);
        let mut users: Vec<NewUser> = Vec::with_capacity(spec.users);
        for offset in ids.iter() {
            let telegram_id = MIN_USER_ID + offset as i64;
            let mut user = generate_user(&mut rng, telegram_id);
            if let Some(previous) = users.last() {
                user = user.referred_by(previous.telegram_id);
            }
            users.push(user);
        }

        let products: Vec<NewProduct> = (0..product_count)
            .map(|_| generate_product(&mut rng))
            .collect();

        let mut orders = Vec::with_capacity(order_count);
        for user in 0..spec.users {
            for _ in 0..spec.orders_per_user {
                let lines = index::sample(&mut rng, product_count, spec.lines_per_order)
                    .iter()
                    .map(|product| PlannedLine {
                        product,
                        quantity: rng.random_range(1..=MAX_QUANTITY),
                    })
                    .collect();
                orders.push(PlannedOrder { user, lines });
            }
        }

        Ok(SeedPlan {
            users,
            products,
            orders,
        })
    }

    /// Total number of order lines in the plan.
    pub fn line_count(&self) -> usize {
        self.orders.iter().map(|o| o.lines.len()).sum()
    }
}

fn generate_user(rng: &mut ChaCha8Rng, telegram_id: i64) -> NewUser {
    let full_name: String = Name(EN).fake_with_rng(rng);
    let user_name: String = Username(EN).fake_with_rng(rng);
    let language = LANGUAGES[rng.random_range(0..LANGUAGES.len())];

    NewUser::new(telegram_id, full_name, language).with_user_name(user_name)
}

fn generate_product(rng: &mut ChaCha8Rng) -> NewProduct {
    let title: String = Word(EN).fake_with_rng(rng);
    let description: String = Sentence(EN, 3..8).fake_with_rng(rng);
    let cents = rng.random_range(MIN_PRICE_CENTS..=MAX_PRICE_CENTS);

    NewProduct::new(title, Decimal::new(cents, 2)).with_description(description)
}

// =============================================================================
// Apply
// =============================================================================

/// Rows written by [`apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub products: usize,
    pub orders: usize,
    pub lines: usize,
}

/// Writes `plan`.
///
/// Users go first, each upserted in its own statement so every row gets its
/// own `created_at` and newest-first listings follow plan order. Each
/// referral points at an already written user. Products, then orders with
/// their lines, are written in a single transaction; a failure there rolls
/// all of them back and leaves the users in place. Re-running upserts the
/// same users again.
pub async fn apply(db: &Database, plan: &SeedPlan) -> DbResult<SeedReport> {
    info!(
        users = plan.users.len(),
        products = plan.products.len(),
        orders = plan.orders.len(),
        lines = plan.line_count(),
        "Seeding database"
    );

    let mut report = SeedReport::default();

    let users = db.users();
    for user in &plan.users {
        users.upsert(user).await?;
        report.users += 1;
    }
    info!(count = report.users, "Users written");

    let mut tx = db.begin().await?;

    let mut product_ids = Vec::with_capacity(plan.products.len());
    for product in &plan.products {
        let created = tx.create_product(product).await?;
        product_ids.push(created.product_id);
    }
    report.products = product_ids.len();
    info!(count = report.products, "Products written");

    for planned in &plan.orders {
        let owner = plan.users[planned.user].telegram_id;
        let order = tx.create_order(owner).await?;
        report.orders += 1;

        for line in &planned.lines {
            tx.link_product(order.order_id, product_ids[line.product], line.quantity)
                .await?;
            report.lines += 1;
        }
        debug!(order_id = order.order_id, lines = planned.lines.len(), "Order seeded");
    }
    info!(orders = report.orders, lines = report.lines, "Orders written");

    tx.commit().await?;

    info!(?report, "Seeding complete");
    Ok(report)
}

// =============================================================================
// Unit Tests
// =============================================================================
