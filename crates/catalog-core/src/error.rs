//! # Error Types
//!
//! Validation errors for catalog input.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  catalog-core errors (this file)                                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  catalog-db errors (separate crate)                                    │
//! │  └── DbError          - Database and transaction failures              │
//! │                         (wraps ValidationError)                         │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → RPC status (service layer)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation errors are returned immediately: nothing has been written
//! when one of these comes back.

use thiserror::Error;

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any query runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, invalid URL, invalid time).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value inside a single request (e.g., two hours for Monday).
    #[error("{field} '{value}' is duplicated")]
    Duplicate { field: String, value: String },

    /// Sort column or direction outside the whitelist.
    ///
    /// ## When This Occurs
    /// - `order_by` names a column that is not sortable
    /// - `direction` is neither `asc` nor `desc`
    /// - The database rejects the ORDER BY clause (unknown column)
    #[error("invalid orderBy or direction: {order_by} {direction}")]
    InvalidSort { order_by: String, direction: String },
}

impl ValidationError {
    /// Creates a Required error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates an InvalidFormat error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("name");
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        };
        assert_eq!(err.to_string(), "name must be at most 200 characters");
    }

    #[test]
    fn test_invalid_sort_message() {
        let err = ValidationError::InvalidSort {
            order_by: "price; DROP TABLE products".to_string(),
            direction: "asc".to_string(),
        };
        assert!(err.to_string().starts_with("invalid orderBy or direction"));
    }
}
