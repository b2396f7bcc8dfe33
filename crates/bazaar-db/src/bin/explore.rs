//! # Explore
//!
//! Runs the read queries against a live database and prints the results.
//!
//! ## Usage
//! ```bash
//! cargo run -p bazaar-db --bin explore -- users --lang en,uk --limit 5
//! cargo run -p bazaar-db --bin explore -- orders 1234
//! cargo run -p bazaar-db --bin explore -- --json quantities --min-total 50000
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use bazaar_core::Timestamped;
use bazaar_db::{Database, DbConfig, ReadinessPolicy};

#[derive(Parser, Debug)]
#[command(name = "explore", about = "Query the Bazaar database from the command line")]
struct Cli {
    /// Print one JSON object per line instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Poll until the server accepts connections before querying
    #[arg(long, global = true)]
    wait: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one user
    User { telegram_id: i64 },
    /// List the newest users speaking one of the given languages
    Users {
        #[arg(long, value_delimiter = ',', default_value = "en,uk,fr")]
        lang: Vec<String>,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Show a user's language code
    Language { telegram_id: i64 },
    /// Every order line of a user, with product and order
    Orders { user_id: i64 },
    /// Number of orders a user owns
    OrderCount { user_id: i64 },
    /// Number of orders per user
    OrderCounts,
    /// Total quantity ordered per user
    Quantities {
        /// Only users whose total is strictly greater than this
        #[arg(long, default_value_t = 50_000)]
        min_total: i64,
    },
    /// Every (referrer, referral) pair
    Referrals,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = DbConfig::from_env().context("loading database settings")?;
    let db = if cli.wait {
        Database::wait_until_ready(config, ReadinessPolicy::default()).await?
    } else {
        Database::connect(config).await?
    };

    let out = Output { json: cli.json };

    match cli.command {
        Command::User { telegram_id } => match db.users().get_by_id(telegram_id).await? {
            Some(user) => out.item(&user, || {
                format!(
                    "{} {} @{} [{}] referred_by={:?}",
                    user.telegram_id,
                    user.full_name,
                    user.user_name.as_deref().unwrap_or("-"),
                    user.language_code,
                    user.referred_id
                )
            })?,
            None => out.missing("user", telegram_id),
        },
        Command::Users { lang, limit } => {
            let languages: Vec<&str> = lang.iter().map(String::as_str).collect();
            for user in db.users().list(&languages, limit).await? {
                out.item(&user, || {
                    format!(
                        "{} {} [{}] created {}",
                        user.telegram_id,
                        user.full_name,
                        user.language_code,
                        user.created_at()
                    )
                })?;
            }
        }
        Command::Language { telegram_id } => match db.users().language(telegram_id).await? {
            Some(language) => out.item(&language, || language.clone())?,
            None => out.missing("user", telegram_id),
        },
        Command::Orders { user_id } => {
            for line in db.orders().lines_for_user(user_id).await? {
                out.item(&line, || {
                    format!(
                        "order {} | {} x{} @ {} | {}",
                        line.order.order_id,
                        line.product.title,
                        line.order_product.quantity,
                        line.product.price,
                        line.user.full_name
                    )
                })?;
            }
        }
        Command::OrderCount { user_id } => {
            let count = db.orders().count_for_user(user_id).await?;
            out.item(&count, || count.to_string())?;
        }
        Command::OrderCounts => {
            for row in db.orders().count_per_user().await? {
                out.item(&row, || {
                    format!("{} {}: {}", row.telegram_id, row.full_name, row.order_count)
                })?;
            }
        }
        Command::Quantities { min_total } => {
            for row in db.orders().quantity_per_user(min_total).await? {
                out.item(&row, || {
                    format!("{} {}: {}", row.telegram_id, row.full_name, row.total_quantity)
                })?;
            }
        }
        Command::Referrals => {
            for pair in db.users().referrals().await? {
                out.item(&pair, || {
                    format!("{} -> {}", pair.referrer_name, pair.referral_name)
                })?;
            }
        }
    }

    db.close().await;
    Ok(())
}

/// Text or JSON-lines printer.
struct Output {
    json: bool,
}

impl Output {
    fn item<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce() -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }

    fn missing(&self, entity: &str, id: i64) {
        if self.json {
            println!("null");
        } else {
            eprintln!("{} {} not found", entity, id);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
