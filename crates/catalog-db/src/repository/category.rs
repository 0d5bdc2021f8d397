//! # Category Repository
//!
//! Product categories plus the per-store category aggregation.
//!
//! ## Category Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              categories_for_store(store, include_deactivated)           │
//! │                                                                         │
//! │  products p ──► product_category_relations r ──► product_categories c  │
//! │  WHERE p.store_id = ?                                                  │
//! │                                                                         │
//! │  include_deactivated = true        include_deactivated = false         │
//! │  GROUP BY c.id, c.name             AND c.is_active = 1                 │
//! │                                    GROUP BY c.id, c.name, c.is_active  │
//! │                                                                         │
//! │  ORDER BY c.name ASC              (no match → empty vec)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The active flag only joins the grouping key when inactive categories are
//! filtered out. Both shapes are kept as they are.
//!
//! Upserts run in a private transaction that never joins a caller's scope.

use catalog_core::validation::{name_key, validate_name};
use catalog_core::{CategoryInput, CategorySummary, ProductCategory};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::push_in_list;
use crate::transaction::TxScope;

const CATEGORY_COLUMNS: &str = "SELECT id, name, is_active, created_at, updated_at FROM product_categories";

/// Repository for product categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Gets a category by id.
    ///
    /// ## Returns
    /// * `Ok(ProductCategory)` - found
    /// * `Err(DbError::NotFound)` - no such id
    pub async fn get(&self, id: i64) -> DbResult<ProductCategory> {
        sqlx::query_as::<_, ProductCategory>(&format!("{CATEGORY_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("ProductCategory", id))
    }

    /// Case-insensitive lookup by name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<ProductCategory>> {
        let category = sqlx::query_as::<_, ProductCategory>(&format!(
            "{CATEGORY_COLUMNS} WHERE name_key = ?1"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn get_by_ids(&self, ids: &[i64]) -> DbResult<Vec<ProductCategory>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(CATEGORY_COLUMNS);
        builder.push(" WHERE id IN ");
        push_in_list(&mut builder, ids);
        builder.push(" ORDER BY name ASC");

        let categories = builder
            .build_query_as::<ProductCategory>()
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// All categories ordered by name; inactive ones only on request.
    pub async fn list(&self, include_deactivated: bool) -> DbResult<Vec<ProductCategory>> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(CATEGORY_COLUMNS);
        if !include_deactivated {
            builder.push(" WHERE is_active = 1");
        }
        builder.push(" ORDER BY name ASC");

        let categories = builder
            .build_query_as::<ProductCategory>()
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    /// Inserts (`id: None`) or updates one category.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - another category already has the name
    /// * `DbError::Busy` - another connection holds the write lock
    ///
    /// Runs on its own pooled connection, never on a caller's scope. Calling
    /// it while the same task holds an open write scope waits out the busy
    /// timeout and fails with `DbError::Busy`.
    pub async fn upsert(&self, input: &CategoryInput) -> DbResult<ProductCategory> {
        let mut saved = self.upsert_many(std::slice::from_ref(input)).await?;
        saved
            .pop()
            .ok_or_else(|| DbError::Internal("category upsert returned no row".to_string()))
    }

    /// Upserts several categories in one private transaction. All or nothing.
    pub async fn upsert_many(&self, inputs: &[CategoryInput]) -> DbResult<Vec<ProductCategory>> {
        for input in inputs {
            validate_name("name", &input.name)?;
        }

        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = inputs.len(), "Upserting product categories");

        let mut scope = TxScope::new(self.pool.clone());
        let owned = scope.begin_if_needed().await?;
        let result = save_categories(&mut scope, inputs).await;
        scope.settle(owned, result).await
    }

    /// Distinct categories used by a store's products, ordered by name.
    pub async fn categories_for_store(
        &self,
        store_id: Uuid,
        include_deactivated: bool,
    ) -> DbResult<Vec<CategorySummary>> {
        debug!(store_id = %store_id, include_deactivated, "Aggregating store categories");

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT c.id, c.name FROM products p \
             INNER JOIN product_category_relations r ON r.product_id = p.id \
             INNER JOIN product_categories c ON c.id = r.category_id \
             WHERE p.store_id = ",
        );
        builder.push_bind(store_id);

        if include_deactivated {
            builder.push(" GROUP BY c.id, c.name");
        } else {
            builder.push(" AND c.is_active = 1 GROUP BY c.id, c.name, c.is_active");
        }
        builder.push(" ORDER BY c.name ASC");

        let categories = builder
            .build_query_as::<CategorySummary>()
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }
}

async fn save_categories(
    scope: &mut TxScope,
    inputs: &[CategoryInput],
) -> DbResult<Vec<ProductCategory>> {
    let conn = scope.connection()?;
    let mut saved = Vec::with_capacity(inputs.len());

    for input in inputs {
        saved.push(save_category(conn, input).await?);
    }

    Ok(saved)
}

async fn save_category(conn: &mut SqliteConnection, input: &CategoryInput) -> DbResult<ProductCategory> {
    let now = Utc::now();
    let name = input.name.trim();

    // NULL id lets SQLite assign the next one; an existing id takes the update branch.
    let category = sqlx::query_as::<_, ProductCategory>(
        r#"
        INSERT INTO product_categories (id, name, name_key, is_active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            name_key = excluded.name_key,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at
        RETURNING id, name, is_active, created_at, updated_at
        "#,
    )
    .bind(input.id)
    .bind(name)
    .bind(name_key(name))
    .bind(input.is_active)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| DbError::from_write(e, name))?;

    Ok(category)
}

// =============================================================================
// Unit Tests
// =============================================================================
