//! # catalog-db: Repository Layer for the Store Catalog
//!
//! SQLite-backed repositories for stores and their product catalog
//! (categories, types, units of measure, products, images), built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Catalog Data Flow                                │
//! │                                                                         │
//! │  RPC handler (external, already validated request shape)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   catalog-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │◄───│ ProductRepo    │   │ 001_catalog_ │  │   │
//! │  │   │ SqlitePool    │    │ ImageRepo      │   │   schema.sql │  │   │
//! │  │   │ TxScope       │    │ CategoryRepo   │   │              │  │   │
//! │  │   │               │    │ StoreRepo ...  │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (file or :memory:)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Pool configuration and `CATALOG_DB_*` environment loading
//! - [`pool`] - Connection pool creation and repository accessors
//! - [`migrations`] - Embedded database migrations
//! - [`transaction`] - Explicit transaction scope with owner-only commit
//! - [`error`] - Database error types
//! - [`repository`] - Per-entity repositories and the product list query
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_db::{Database, DbConfig, ProductListQuery};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let page = db
//!     .products()
//!     .list_products(ProductListQuery::for_store(store_id).order_by("price", "desc"))
//!     .await?;
//!
//! let mut scope = db.scope();
//! scope.begin_if_needed().await?;
//! db.products().upsert_products(&mut scope, &products).await?;
//! scope.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod transaction;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DbConfig};
pub use error::{DbError, DbResult};
pub use pool::Database;
pub use transaction::TxScope;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::image::ImageRepository;
pub use repository::product::ProductRepository;
pub use repository::product_query::{ProductListQuery, ProductPage};
pub use repository::product_type::ProductTypeRepository;
pub use repository::store::StoreRepository;
pub use repository::unit::UnitOfMeasureRepository;
