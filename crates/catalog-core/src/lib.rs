//! # catalog-core: Pure Domain Logic for the Storefront Catalog
//!
//! This crate holds everything about the catalog that can be expressed
//! without touching a database: the entity shapes, the pagination
//! calculator, the sort whitelist and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Catalog Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              RPC service layer (external collaborator)          │   │
//! │  │    ListProducts, UpsertProducts, CategoriesForStore, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed parameters                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ catalog-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │pagination │  │   sort    │  │ validation│  │   │
//! │  │   │  Product  │  │ PageReq   │  │ whitelist │  │   rules   │  │   │
//! │  │   │  Store    │  │ Pagination│  │ Direction │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  catalog-db (Repository Layer)                  │   │
//! │  │       SQLite queries, transactions, migrations, repositories    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog entities (Store, Product, ProductType, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pagination`] - Page request normalization and page math
//! - [`sort`] - Closed set of sortable product columns
//! - [`error`] - Validation error type
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use catalog_core::pagination::compute_pagination;
//!
//! // Page 0 is normalized to page 1, a zero limit to the default of 10
//! let page = compute_pagination(0, 0, 42, 10);
//! assert_eq!(page.page, 1);
//! assert_eq!(page.limit, 10);
//! assert_eq!(page.offset, 0);
//! assert_eq!(page.total_pages, 5);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pagination;
pub mod sort;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use money::Money;
pub use pagination::{compute_pagination, PageRequest, Pagination};
pub use sort::{ProductSort, ProductSortColumn, SortDirection};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page used when the caller asks for page zero or a negative page.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the caller asks for a zero or negative limit.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Longest name accepted for any catalog entity.
pub const MAX_NAME_LENGTH: usize = 200;

/// Longest image URL accepted.
pub const MAX_URL_LENGTH: usize = 2048;
