//! # bazaar-core: Schema Model for Bazaar
//!
//! This crate holds the typed table definitions shared by every layer of
//! Bazaar. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Binaries (seed, explore)                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 bazaar-db (Data-Access Layer)                   │   │
//! │  │        PgPool, migrations, repositories, seed driver            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐                │   │
//! │  │   │   types   │  │   error   │  │ validation  │                │   │
//! │  │   │   User    │  │Validation │  │ field rules │                │   │
//! │  │   │  Product  │  │  Error    │  │  lengths    │                │   │
//! │  │   │  Order    │  └───────────┘  └─────────────┘                │   │
//! │  │   └───────────┘                                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity types (User, Product, Order, OrderProduct) and row shapes
//! - [`error`] - Validation error types
//! - [`validation`] - Field rules applied before a write reaches the store
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::{validation, NewUser, Table, User};
//!
//! let user = NewUser::new(1, "John Doe", "en").with_user_name("johnny");
//! validation::validate_new_user(&user).unwrap();
//!
//! assert_eq!(User::TABLE, "users");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;

// =============================================================================
// Column Limits
// =============================================================================
// These mirror the column definitions in the Postgres migrations.

/// Maximum length of `VARCHAR(255)` columns (names, titles).
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of `users.language_code` (`VARCHAR(10)`).
pub const MAX_LANGUAGE_CODE_LEN: usize = 10;

/// Maximum length of `products.description` (`VARCHAR(3000)`).
pub const MAX_DESCRIPTION_LEN: usize = 3000;

/// Total digits of `products.price` (`NUMERIC(16, 4)`).
pub const PRICE_PRECISION: u32 = 16;

/// Fractional digits of `products.price` (`NUMERIC(16, 4)`).
pub const PRICE_SCALE: u32 = 4;
