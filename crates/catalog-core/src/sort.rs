//! # Sort Whitelist
//!
//! The closed set of ways a product listing can be ordered.
//!
//! ## Why A Whitelist?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ❌ format!("ORDER BY {} {}", order_by, direction)                      │
//! │     order_by = "name; DROP TABLE products" → goes straight to SQL      │
//! │                                                                         │
//! │  ✅ ProductSort::parse(order_by, direction)?.order_clause()            │
//! │     Only &'static str fragments ever reach the query text.             │
//! │     Anything else fails here with ValidationError::InvalidSort.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Product columns a caller may order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortColumn {
    #[default]
    Name,
    Price,
    Stock,
    SaleStatus,
    CreatedAt,
    UpdatedAt,
}

impl ProductSortColumn {
    pub const ALL: [ProductSortColumn; 6] = [
        ProductSortColumn::Name,
        ProductSortColumn::Price,
        ProductSortColumn::Stock,
        ProductSortColumn::SaleStatus,
        ProductSortColumn::CreatedAt,
        ProductSortColumn::UpdatedAt,
    ];

    /// Name accepted from callers.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductSortColumn::Name => "name",
            ProductSortColumn::Price => "price",
            ProductSortColumn::Stock => "stock",
            ProductSortColumn::SaleStatus => "sale_status",
            ProductSortColumn::CreatedAt => "created_at",
            ProductSortColumn::UpdatedAt => "updated_at",
        }
    }

    /// Qualified column in the product listing query (`p` = products).
    pub const fn column(&self) -> &'static str {
        match self {
            ProductSortColumn::Name => "p.name",
            ProductSortColumn::Price => "p.price_cents",
            ProductSortColumn::Stock => "p.stock",
            ProductSortColumn::SaleStatus => "p.sale_status",
            ProductSortColumn::CreatedAt => "p.created_at",
            ProductSortColumn::UpdatedAt => "p.updated_at",
        }
    }

    fn parse(input: &str) -> Option<Self> {
        let key = input.trim().to_ascii_lowercase();
        match key.as_str() {
            // empty means "caller did not choose"
            "" | "name" => Some(ProductSortColumn::Name),
            "price" | "price_cents" => Some(ProductSortColumn::Price),
            "stock" => Some(ProductSortColumn::Stock),
            "sale_status" | "salestatus" => Some(ProductSortColumn::SaleStatus),
            "created_at" | "createdat" => Some(ProductSortColumn::CreatedAt),
            "updated_at" | "updatedat" => Some(ProductSortColumn::UpdatedAt),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "" | "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// A validated (column, direction) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProductSort {
    pub column: ProductSortColumn,
    pub direction: SortDirection,
}

impl ProductSort {
    pub const fn new(column: ProductSortColumn, direction: SortDirection) -> Self {
        ProductSort { column, direction }
    }

    /// Parses caller-supplied strings against the whitelist.
    ///
    /// Both values are matched case-insensitively. An empty string picks
    /// the default (`name`, `asc`).
    ///
    /// ## Example
    /// ```rust
    /// use catalog_core::sort::{ProductSort, ProductSortColumn, SortDirection};
    ///
    /// let sort = ProductSort::parse("price", "DESC").unwrap();
    /// assert_eq!(sort.column, ProductSortColumn::Price);
    /// assert_eq!(sort.direction, SortDirection::Desc);
    ///
    /// assert!(ProductSort::parse("price; --", "asc").is_err());
    /// ```
    pub fn parse(order_by: &str, direction: &str) -> Result<Self, ValidationError> {
        match (ProductSortColumn::parse(order_by), SortDirection::parse(direction)) {
            (Some(column), Some(direction)) => Ok(ProductSort { column, direction }),
            _ => Err(ValidationError::InvalidSort {
                order_by: order_by.to_string(),
                direction: direction.to_string(),
            }),
        }
    }

    /// ORDER BY fragment for this pair, e.g. `p.price_cents DESC`.
    ///
    /// Built only from static strings; `p.id` breaks ties so paging is
    /// stable across pages.
    pub fn order_clause(&self) -> String {
        format!(
            "{} {}, p.id ASC",
            self.column.column(),
            self.direction.as_sql()
        )
    }
}
