//! # Validation Module
//!
//! Field rules applied before a write reaches the store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE                                                  │
//! │  ├── Required fields, column lengths                                   │
//! │  └── Price precision, positive quantities                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (PostgreSQL)                                        │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── Primary keys (telegram_id, (order_id, product_id))                │
//! │  └── Foreign keys (referred_id, user_id, order/product ids)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lengths are counted in characters, matching how Postgres measures
//! `VARCHAR(n)`.
//!
//! ## Usage
//! ```rust
//! use bazaar_core::validation::{validate_language_code, validate_quantity};
//!
//! assert!(validate_language_code("en").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use rust_decimal::Decimal;

use crate::error::{ValidationError, ValidationResult};
use crate::types::{NewProduct, NewUser};
use crate::{MAX_DESCRIPTION_LEN, MAX_LANGUAGE_CODE_LEN, MAX_NAME_LEN, PRICE_PRECISION, PRICE_SCALE};

// =============================================================================
// Helpers
// =============================================================================

fn require(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    limit(field, value, max)
}

fn limit(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::too_long(field, max));
    }
    Ok(())
}

// =============================================================================
// User Fields
// =============================================================================

/// Validates a user's full name: required, at most 255 characters.
pub fn validate_full_name(full_name: &str) -> ValidationResult<()> {
    require("full_name", full_name, MAX_NAME_LEN)
}

/// Validates an optional user name: at most 255 characters when present.
pub fn validate_user_name(user_name: Option<&str>) -> ValidationResult<()> {
    match user_name {
        Some(name) => limit("user_name", name, MAX_NAME_LEN),
        None => Ok(()),
    }
}

/// Validates a language code: required, at most 10 characters, no spaces.
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_language_code;
///
/// assert!(validate_language_code("uk").is_ok());
/// assert!(validate_language_code("").is_err());
/// assert!(validate_language_code("en gb").is_err());
/// ```
pub fn validate_language_code(code: &str) -> ValidationResult<()> {
    require("language_code", code, MAX_LANGUAGE_CODE_LEN)?;

    if code.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "language_code".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates every field of a [`NewUser`].
pub fn validate_new_user(user: &NewUser) -> ValidationResult<()> {
    validate_full_name(&user.full_name)?;
    validate_user_name(user.user_name.as_deref())?;
    validate_language_code(&user.language_code)?;
    Ok(())
}

// =============================================================================
// Product Fields
// =============================================================================

/// Validates a product title: required, at most 255 characters.
pub fn validate_title(title: &str) -> ValidationResult<()> {
    require("title", title, MAX_NAME_LEN)
}

/// Validates an optional description: at most 3000 characters.
pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(text) => limit("description", text, MAX_DESCRIPTION_LEN),
        None => Ok(()),
    }
}

/// Validates a price against `NUMERIC(16, 4)`.
///
/// ## Rules
/// - Not negative
/// - At most 4 fractional digits (after dropping trailing zeros)
/// - At most 12 integer digits
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_price;
/// use rust_decimal::Decimal;
///
/// assert!(validate_price(Decimal::new(1999, 2)).is_ok());   // 19.99
/// assert!(validate_price(Decimal::new(-1, 0)).is_err());
/// assert!(validate_price(Decimal::new(12345, 5)).is_err()); // 0.12345
/// ```
pub fn validate_price(price: Decimal) -> ValidationResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if price.normalize().scale() > PRICE_SCALE {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: format!("at most {} decimal places", PRICE_SCALE),
        });
    }

    let integer_digits = PRICE_PRECISION - PRICE_SCALE;
    let bound = Decimal::from(10i64.pow(integer_digits));
    if price.trunc() >= bound {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: format!("at most {} integer digits", integer_digits),
        });
    }

    Ok(())
}

/// Validates every field of a [`NewProduct`].
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_title(&product.title)?;
    validate_description(product.description.as_deref())?;
    validate_price(product.price)?;
    Ok(())
}

// =============================================================================
// Order Fields
// =============================================================================

/// Validates an order line quantity: must be positive.
pub fn validate_quantity(quantity: i32) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        assert!(validate_full_name("John Doe").is_ok());
        assert_eq!(
            validate_full_name("   "),
            Err(ValidationError::required("full_name"))
        );
        assert_eq!(
            validate_full_name(&"x".repeat(256)),
            Err(ValidationError::too_long("full_name", 255))
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 255 two-byte characters still fit VARCHAR(255)
        let name = "é".repeat(255);
        assert!(validate_full_name(&name).is_ok());
    }

    #[test]
    fn test_user_name_is_optional() {
        assert!(validate_user_name(None).is_ok());
        assert!(validate_user_name(Some("johnny")).is_ok());
        assert!(validate_user_name(Some(&"u".repeat(300))).is_err());
    }

    #[test]
    fn test_language_code() {
        assert!(validate_language_code("en").is_ok());
        assert!(validate_language_code("pt-BR").is_ok());
        assert!(validate_language_code("").is_err());
        assert!(validate_language_code("abcdefghijk").is_err());
    }

    #[test]
    fn test_new_user() {
        let user = NewUser::new(1, "John Doe", "en").with_user_name("johnny");
        assert!(validate_new_user(&user).is_ok());

        let user = NewUser::new(1, "", "en");
        assert!(validate_new_user(&user).is_err());
    }

    #[test]
    fn test_price() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(99_999_999_999_999, 4)).is_ok());
        // trailing zeros don't count against the scale
        assert!(validate_price(Decimal::new(1_500_000, 6)).is_ok());
        assert!(validate_price(Decimal::new(-1, 2)).is_err());
        assert!(validate_price(Decimal::new(1, 5)).is_err());
        assert!(validate_price(Decimal::from(1_000_000_000_000i64)).is_err());
    }

    #[test]
    fn test_description() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some(&"d".repeat(3000))).is_ok());
        assert!(validate_description(Some(&"d".repeat(3001))).is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }
}
