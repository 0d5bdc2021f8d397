//! # Domain Types
//!
//! Catalog entities shared by the repository layer and its callers.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Catalog Entities                                │
//! │                                                                         │
//! │  Store (UUID) ──┬── StoreHours (UUID, one per weekday)                 │
//! │                 ├── tags (text)                                        │
//! │                 └── Product (UUID) ──── ProductImage (UUID)            │
//! │                        │    │                                          │
//! │                        │    └──► UnitOfMeasure (INTEGER)               │
//! │                        ▼                                               │
//! │                  ProductType (INTEGER) ──► ProductCategory (INTEGER)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Shape vs Read Shape
//! [`Product`] is exactly what the `products` table stores. The type and
//! category names a caller wants to display live on [`ProductView`], which
//! the repository builds from joined rows after every fetch. Writing a
//! `ProductView` back is not possible: the denormalized fields never reach
//! the products table.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Store
// =============================================================================

/// A storefront that owns products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Creates a new active store with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Store {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Opening hours for one weekday.
///
/// `day_of_week` counts from Monday = 0 to Sunday = 6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoreHours {
    pub id: Uuid,
    pub store_id: Uuid,
    pub day_of_week: i64,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl StoreHours {
    pub fn new(store_id: Uuid, day_of_week: i64, opens_at: NaiveTime, closes_at: NaiveTime) -> Self {
        StoreHours {
            id: Uuid::new_v4(),
            store_id,
            day_of_week,
            opens_at,
            closes_at,
        }
    }
}

// =============================================================================
// Category / Type / Unit of Measure
// =============================================================================

/// Top-level product grouping (e.g. "Food").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductCategory {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product type inside one category (e.g. "Snacks" in "Food").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductType {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unit a product is sold in (e.g. "Kilogram", "kg").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UnitOfMeasure {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert payload for a category. `id: None` inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub id: Option<i64>,
    pub name: String,
    pub is_active: bool,
}

impl CategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        CategoryInput {
            id: None,
            name: name.into(),
            is_active: true,
        }
    }
}

/// Upsert payload for a product type. `id: None` inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTypeInput {
    pub id: Option<i64>,
    pub category_id: i64,
    pub name: String,
    pub is_active: bool,
}

impl ProductTypeInput {
    pub fn new(category_id: i64, name: impl Into<String>) -> Self {
        ProductTypeInput {
            id: None,
            category_id,
            name: name.into(),
            is_active: true,
        }
    }
}

/// Upsert payload for a unit of measure. `id: None` inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOfMeasureInput {
    pub id: Option<i64>,
    pub name: String,
    pub symbol: String,
    pub is_active: bool,
}

impl UnitOfMeasureInput {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        UnitOfMeasureInput {
            id: None,
            name: name.into(),
            symbol: symbol.into(),
            is_active: true,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product row exactly as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: Uuid,

    /// Store this product belongs to.
    pub store_id: Uuid,

    /// Display name, unique per store (case-insensitive).
    pub name: String,

    /// Whether the product is on sale. `false` = deactivated.
    pub sale_status: bool,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units in stock. Not range-checked; may go negative.
    pub stock: i64,

    pub unit_of_measure_id: i64,
    pub product_type_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new on-sale product with a fresh id.
    pub fn new(
        store_id: Uuid,
        name: impl Into<String>,
        price: Money,
        unit_of_measure_id: i64,
        product_type_id: i64,
    ) -> Self {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            store_id,
            name: name.into(),
            sale_status: true,
            price_cents: price.cents(),
            stock: 0,
            unit_of_measure_id,
            product_type_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// Kind of product image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    Primary,
    Gallery,
    Thumbnail,
}

/// An image attached to a product. Persisted separately from the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_type: ImageType,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl ProductImage {
    pub fn new(product_id: Uuid, image_type: ImageType, url: impl Into<String>) -> Self {
        ProductImage {
            id: Uuid::new_v4(),
            product_id,
            image_type,
            url: url.into(),
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Read Models
// =============================================================================

/// A product together with the fields derived from its joined relations.
///
/// Built by the repository after each fetch; never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub product_type_name: String,
    pub product_category_id: i64,
    pub product_category_name: String,
    pub images: Vec<ProductImage>,
}

/// One row of the per-store category aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
