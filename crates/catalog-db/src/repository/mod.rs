//! # Repository Module
//!
//! Per-entity repositories for the catalog.
//!
//! ## Read/Write Split
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Call Shapes                               │
//! │                                                                         │
//! │  Reads                         → &self, run straight on the pool       │
//! │    get_*            (required) → Err(NotFound) when absent             │
//! │    get_*_by_name               → Ok(None) when absent                  │
//! │    get_*_by_ids / list_*       → Ok(vec![]) when nothing matches       │
//! │                                                                         │
//! │  Product / image / store writes → &mut TxScope, owner pattern          │
//! │    upsert_products               requires an open scope                │
//! │    upsert_images / delete_*      open one if the caller hasn't         │
//! │                                                                         │
//! │  Category / type / unit writes  → own private transaction              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product reads, listing, upserts, deletes
//! - [`image::ImageRepository`] - Product images
//! - [`category::CategoryRepository`] - Categories and the per-store aggregation
//! - [`product_type::ProductTypeRepository`] - Product types
//! - [`unit::UnitOfMeasureRepository`] - Units of measure
//! - [`store::StoreRepository`] - Stores, opening hours and tags

pub mod category;
pub mod image;
pub mod product;
pub mod product_query;
pub mod product_type;
pub mod store;
pub mod unit;

use sqlx::{QueryBuilder, Sqlite};

/// Appends `(?, ?, ...)` binding every value, for `IN` lists.
///
/// Callers must short-circuit on empty input; `IN ()` is not valid SQLite.
pub(crate) fn push_in_list<'a, T>(builder: &mut QueryBuilder<'a, Sqlite>, values: &[T])
where
    T: 'a + Clone + Send + sqlx::Encode<'a, Sqlite> + sqlx::Type<Sqlite>,
{
    builder.push("(");
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");
}
