//! # Seed Data Generator
//!
//! Populates the database with deterministic users, products and orders.
//!
//! ## Usage
//! ```bash
//! # 10 users, 10 orders and 10 products each, 3 lines per order
//! cargo run -p bazaar-db --bin seed
//!
//! # Start from an empty schema
//! cargo run -p bazaar-db --bin seed -- --reset
//!
//! # Custom shape
//! cargo run -p bazaar-db --bin seed -- --seed 42 --users 50 --lines-per-order 5
//! ```
//!
//! Connection settings come from the environment (or `.env`):
//! `POSTGRES_USER`, `POSTGRES_PASSWORD`, `DATABASE_HOST`, `POSTGRES_DB`,
//! and optionally `DATABASE_PORT`, `DATABASE_POOL_SIZE`, `DATABASE_MAX_OVERFLOW`.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bazaar_db::seed::{self, SeedPlan, SeedSpec};
use bazaar_db::{Database, DbConfig, ReadinessPolicy};

#[derive(Parser, Debug)]
#[command(name = "seed", about = "Populate the Bazaar database with sample data")]
struct Args {
    /// RNG seed; the same value always produces the same data
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Number of users
    #[arg(long, default_value_t = 10)]
    users: usize,

    /// Orders owned by each user
    #[arg(long, default_value_t = 10)]
    orders_per_user: usize,

    /// Products created per user
    #[arg(long, default_value_t = 10)]
    products_per_user: usize,

    /// Distinct products linked to each order
    #[arg(long, default_value_t = 3)]
    lines_per_order: usize,

    /// Drop and recreate every table before seeding
    #[arg(long)]
    reset: bool,

    /// Seconds between readiness checks while the server starts
    #[arg(long, default_value_t = 2)]
    wait_interval: u64,

    /// Readiness checks before giving up
    #[arg(long, default_value_t = 30)]
    wait_attempts: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let spec = SeedSpec {
        seed: args.seed,
        users: args.users,
        orders_per_user: args.orders_per_user,
        products_per_user: args.products_per_user,
        lines_per_order: args.lines_per_order,
    };
    let plan = SeedPlan::generate(&spec).context("invalid seed shape")?;

    let config = DbConfig::from_env().context("loading database settings")?;
    let policy = ReadinessPolicy::unbounded(Duration::from_secs(args.wait_interval))
        .max_attempts(args.wait_attempts);
    let db = Database::wait_until_ready(config, policy).await?;

    if args.reset {
        db.reset().await.context("resetting schema")?;
        info!("Schema reset");
    }

    let start = Instant::now();
    let report = seed::apply(&db, &plan).await.context("writing seed data")?;

    info!(
        users = report.users,
        products = report.products,
        orders = report.orders,
        lines = report.lines,
        elapsed = ?start.elapsed(),
        "Seed finished"
    );

    let total_users = db.users().count().await?;
    let total_orders = db.orders().count().await?;
    info!(total_users, total_orders, "Database totals");

    db.close().await;
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show every statement
/// - Default: INFO level, sqlx at WARN
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
