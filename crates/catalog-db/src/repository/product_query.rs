//! # Product List Query
//!
//! Composition of the paginated, filterable, sortable product listing.
//!
//! ## Query Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   list_products(ProductListQuery)                       │
//! │                                                                         │
//! │  1. ProductSort::parse(order_by, direction)?   ← whitelist, no DB yet  │
//! │  2. validate_search_query(search)?                                     │
//! │                                                                         │
//! │  SELECT p.*, t.name, c.id, c.name                                      │
//! │  FROM products p                                                       │
//! │  JOIN product_types t      ON t.id = p.product_type_id                 │
//! │  JOIN product_categories c ON c.id = t.category_id                     │
//! │  WHERE p.store_id = ?                         (always)                 │
//! │    AND p.sale_status = 1                      (unless deactivated ok)  │
//! │    AND p.product_type_id = ?                  (type filter)            │
//! │    AND p.name_key LIKE ? ESCAPE '\'           (search)                 │
//! │  ORDER BY <static fragment>, p.id ASC                                  │
//! │  LIMIT ? OFFSET ?                                                      │
//! │                                                                         │
//! │  3. images for the page: one IN (...) query                            │
//! │  4. rows + images → ProductView                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Classification
//! | Driver error                              | Result                      |
//! |-------------------------------------------|-----------------------------|
//! | message has "no such column"/"syntax error" | `Validation(InvalidSort)` |
//! | `sqlx::Error::ColumnNotFound`             | empty page, no error        |
//! | anything else                             | `From<sqlx::Error>`         |

use std::collections::HashMap;

use catalog_core::validation::name_key;
use catalog_core::{
    compute_pagination, PageRequest, Pagination, Product, ProductImage, ProductView,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// Public Query Types
// =============================================================================

/// Parameters of a product listing.
///
/// ## Example
/// ```rust,ignore
/// let query = ProductListQuery::for_store(store_id)
///     .product_type(3)
///     .search("apple")
///     .order_by("price", "desc")
///     .page(2, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListQuery {
    pub store_id: Uuid,
    pub product_type_id: Option<i64>,
    pub search: Option<String>,
    pub include_deactivated: bool,
    /// Raw caller value; checked against the sort whitelist before use.
    pub order_by: String,
    /// Raw caller value (`asc`/`desc`).
    pub direction: String,
    pub page: PageRequest,
}

impl ProductListQuery {
    /// Active products of one store, default sort, first page.
    pub fn for_store(store_id: Uuid) -> Self {
        ProductListQuery {
            store_id,
            product_type_id: None,
            search: None,
            include_deactivated: false,
            order_by: String::new(),
            direction: String::new(),
            page: PageRequest::default(),
        }
    }

    pub fn product_type(mut self, product_type_id: i64) -> Self {
        self.product_type_id = Some(product_type_id);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn include_deactivated(mut self, include: bool) -> Self {
        self.include_deactivated = include;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>, direction: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self.direction = direction.into();
        self
    }

    pub fn page(mut self, page: i64, limit: i64) -> Self {
        self.page = PageRequest::new(page, limit);
        self
    }
}

/// One page of products plus its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<ProductView>,
    pub pagination: Pagination,
}

impl ProductPage {
    /// A page with no products and `total_records = 0`.
    pub fn empty(page: PageRequest) -> Self {
        ProductPage {
            products: Vec::new(),
            pagination: compute_pagination(page.page, page.limit, 0, 0),
        }
    }
}

// =============================================================================
// SQL Fragments
// =============================================================================

/// Product columns plus the joined names that feed [`ProductView`].
pub(crate) const PRODUCT_COLUMNS: &str = "SELECT \
    p.id, p.store_id, p.name, p.sale_status, p.price_cents, p.stock, \
    p.unit_of_measure_id, p.product_type_id, p.created_at, p.updated_at, \
    t.name AS product_type_name, \
    c.id AS product_category_id, \
    c.name AS product_category_name";

pub(crate) const PRODUCT_FROM: &str = " FROM products p \
    INNER JOIN product_types t ON t.id = p.product_type_id \
    INNER JOIN product_categories c ON c.id = t.category_id";

/// A joined product row before images are attached.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub product_type_name: String,
    pub product_category_id: i64,
    pub product_category_name: String,
}

/// Starts `SELECT ... FROM products p JOIN ...`, ready for a WHERE clause.
pub(crate) fn select_products<'a>() -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::new(PRODUCT_COLUMNS);
    builder.push(PRODUCT_FROM);
    builder
}

/// Appends the WHERE clause of a listing.
///
/// Every value is bound; only static text is pushed.
pub(crate) fn push_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    query: &ProductListQuery,
    search: Option<&str>,
) {
    builder.push(" WHERE p.store_id = ").push_bind(query.store_id);

    if !query.include_deactivated {
        builder.push(" AND p.sale_status = 1");
    }

    if let Some(product_type_id) = query.product_type_id {
        builder
            .push(" AND p.product_type_id = ")
            .push_bind(product_type_id);
    }

    if let Some(search) = search {
        builder
            .push(" AND p.name_key LIKE ")
            .push_bind(like_pattern(&name_key(search)))
            .push(" ESCAPE '\\'");
    }
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

// =============================================================================
// Projection
// =============================================================================

/// Builds read models from joined rows and the images fetched for them.
///
/// Row order is kept. Products without images get an empty list.
pub(crate) fn project(rows: Vec<ProductRow>, images: Vec<ProductImage>) -> Vec<ProductView> {
    let mut by_product: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    for image in images {
        by_product.entry(image.product_id).or_default().push(image);
    }

    rows.into_iter()
        .map(|row| {
            let images = by_product.remove(&row.product.id).unwrap_or_default();
            ProductView {
                product: row.product,
                product_type_name: row.product_type_name,
                product_category_id: row.product_category_id,
                product_category_name: row.product_category_name,
                images,
            }
        })
        .collect()
}

// =============================================================================
// Error Classification
// =============================================================================

/// Turns a listing failure into its result.
///
/// `ColumnNotFound` means a decoded column was absent from the row set and
/// degrades to an empty page. A rejected ORDER BY (unknown column or syntax)
/// is reported as an invalid sort. Everything else goes through
/// `From<sqlx::Error>` unchanged.
pub(crate) fn classify_list_error(err: sqlx::Error, query: &ProductListQuery) -> DbResult<ProductPage> {
    match err {
        sqlx::Error::ColumnNotFound(column) => {
            debug!(column = %column, store_id = %query.store_id, "Listing column absent, returning empty page");
            Ok(ProductPage::empty(query.page))
        }
        sqlx::Error::Database(db_err) if is_invalid_sort_message(db_err.message()) => {
            debug!(message = %db_err.message(), "Listing rejected by database as invalid sort");
            Err(DbError::Validation(ValidationError::InvalidSort {
                order_by: query.order_by.clone(),
                direction: query.direction.clone(),
            }))
        }
        other => Err(other.into()),
    }
}

fn is_invalid_sort_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("no such column") || message.contains("syntax error")
}

// =============================================================================
// Unit Tests
// =============================================================================
