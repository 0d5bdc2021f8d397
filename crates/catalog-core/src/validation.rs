//! # Validation Module
//!
//! Input validation for catalog writes and listing parameters.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: RPC request validation (external)                            │
//! │  ├── Shape checks (required fields present)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE, called by the repositories                      │
//! │  ├── Names, prices, URLs, hours, search text                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE indexes (case-insensitive names)                           │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Name uniqueness is deliberately NOT checked here: the unique indexes
//! own that rule and the repository surfaces their violations.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::ValidationError;
use crate::types::{Product, ProductImage, StoreHours};
use crate::{MAX_NAME_LENGTH, MAX_URL_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name for any catalog entity.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most [`MAX_NAME_LENGTH`] characters
///
/// ## Example
/// ```rust
/// use catalog_core::validation::validate_name;
///
/// assert!(validate_name("name", "Green Apples").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Comparison key for a name: trimmed and lowercased with full Unicode
/// case mapping. Uniqueness and name lookups go through this key, so
/// "Äpfel" and "äpfel" collide where SQLite's `NOCASE` would not.
///
/// ```rust
/// use catalog_core::validation::name_key;
///
/// assert_eq!(name_key("  Äpfel "), "äpfel");
/// ```
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Validates a unit-of-measure symbol (`kg`, `pcs`, `ml`).
pub fn validate_symbol(symbol: &str) -> ValidationResult<()> {
    let symbol = symbol.trim();

    if symbol.is_empty() {
        return Err(ValidationError::required("symbol"));
    }

    if symbol.chars().count() > 16 {
        return Err(ValidationError::TooLong {
            field: "symbol".to_string(),
            max: 16,
        });
    }

    Ok(())
}

/// Validates free-text search input.
///
/// ## Returns
/// The trimmed query, or `None` when there is nothing to search for.
pub fn validate_search_query(query: &str) -> ValidationResult<Option<String>> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    if query.is_empty() {
        return Ok(None);
    }

    Ok(Some(query.to_string()))
}

/// Validates an image URL.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_URL_LENGTH`] characters
/// - Must use the `http` or `https` scheme
pub fn validate_image_url(url: &str) -> ValidationResult<()> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::required("url"));
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "url".to_string(),
            max: MAX_URL_LENGTH,
        });
    }

    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("https://") || lower.starts_with("http://")) {
        return Err(ValidationError::invalid_format(
            "url",
            "must start with http:// or https://",
        ));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates a product before it is upserted.
///
/// Stock is intentionally unchecked.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_price_cents(product.price_cents)?;
    Ok(())
}

/// Validates an image before it is upserted.
pub fn validate_image(image: &ProductImage) -> ValidationResult<()> {
    validate_image_url(&image.url)
}

/// Validates the full set of opening hours sent with a store update.
///
/// ## Rules
/// - `day_of_week` in 0..=6 (Monday = 0)
/// - `opens_at` strictly before `closes_at`
/// - At most one entry per weekday
pub fn validate_store_hours(hours: &[StoreHours]) -> ValidationResult<()> {
    let mut seen = HashSet::new();

    for entry in hours {
        if !(0..=6).contains(&entry.day_of_week) {
            return Err(ValidationError::OutOfRange {
                field: "day_of_week".to_string(),
                min: 0,
                max: 6,
            });
        }

        if entry.opens_at >= entry.closes_at {
            return Err(ValidationError::invalid_format(
                "hours",
                format!(
                    "opens_at {} must be before closes_at {}",
                    entry.opens_at, entry.closes_at
                ),
            ));
        }

        if !seen.insert(entry.day_of_week) {
            return Err(ValidationError::Duplicate {
                field: "day_of_week".to_string(),
                value: entry.day_of_week.to_string(),
            });
        }
    }

    Ok(())
}

/// Validates store tags: each non-empty, at most 50 characters.
pub fn validate_tags(tags: &[String]) -> ValidationResult<()> {
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(ValidationError::required("tag"));
        }
        if tag.chars().count() > 50 {
            return Err(ValidationError::TooLong {
                field: "tag".to_string(),
                max: 50,
            });
        }
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Parses a UUID string, reporting which field was malformed.
///
/// ## Example
/// ```rust
/// use catalog_core::validation::parse_uuid;
///
/// assert!(parse_uuid("store_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(parse_uuid("store_id", "not-a-uuid").is_err());
/// ```
pub fn parse_uuid(field: &str, id: &str) -> ValidationResult<Uuid> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    Uuid::parse_str(id.trim())
        .map_err(|_| ValidationError::invalid_format(field, "must be a valid UUID"))
}

// =============================================================================
// Unit Tests
// =============================================================================
