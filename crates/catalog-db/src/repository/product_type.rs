//! # Product Type Repository
//!
//! Product types belong to exactly one category. Names are unique inside a
//! category (case-insensitive), so "Snacks" can exist under both "Food" and
//! "Pets".
//!
//! Upserts run in a private transaction, like categories and units.

use catalog_core::validation::{name_key, validate_name};
use catalog_core::{ProductType, ProductTypeInput};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::push_in_list;
use crate::transaction::TxScope;

const TYPE_COLUMNS: &str =
    "SELECT id, category_id, name, is_active, created_at, updated_at FROM product_types";

/// Repository for product types.
#[derive(Debug, Clone)]
pub struct ProductTypeRepository {
    pool: SqlitePool,
}

impl ProductTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductTypeRepository { pool }
    }

    /// Gets a product type by id. Absent → `DbError::NotFound`.
    pub async fn get(&self, id: i64) -> DbResult<ProductType> {
        sqlx::query_as::<_, ProductType>(&format!("{TYPE_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("ProductType", id))
    }

    /// Case-insensitive lookup by name.
    ///
    /// Names only have to be unique per category; with duplicates across
    /// categories the lowest id wins.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<ProductType>> {
        let product_type = sqlx::query_as::<_, ProductType>(&format!(
            "{TYPE_COLUMNS} WHERE name_key = ?1 ORDER BY id ASC LIMIT 1"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(product_type)
    }

    pub async fn get_by_ids(&self, ids: &[i64]) -> DbResult<Vec<ProductType>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(TYPE_COLUMNS);
        builder.push(" WHERE id IN ");
        push_in_list(&mut builder, ids);
        builder.push(" ORDER BY name ASC");

        let types = builder
            .build_query_as::<ProductType>()
            .fetch_all(&self.pool)
            .await?;

        Ok(types)
    }

    pub async fn list(&self, include_deactivated: bool) -> DbResult<Vec<ProductType>> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(TYPE_COLUMNS);
        if !include_deactivated {
            builder.push(" WHERE is_active = 1");
        }
        builder.push(" ORDER BY name ASC");

        let types = builder
            .build_query_as::<ProductType>()
            .fetch_all(&self.pool)
            .await?;

        Ok(types)
    }

    /// Types of one category, ordered by name.
    pub async fn list_for_category(
        &self,
        category_id: i64,
        include_deactivated: bool,
    ) -> DbResult<Vec<ProductType>> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(TYPE_COLUMNS);
        builder.push(" WHERE category_id = ").push_bind(category_id);
        if !include_deactivated {
            builder.push(" AND is_active = 1");
        }
        builder.push(" ORDER BY name ASC");

        let types = builder
            .build_query_as::<ProductType>()
            .fetch_all(&self.pool)
            .await?;

        Ok(types)
    }

    /// Inserts (`id: None`) or updates one product type.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - name taken inside the category
    /// * `DbError::ForeignKeyViolation` - category does not exist
    /// * `DbError::Busy` - another connection holds the write lock
    ///
    /// Runs on its own pooled connection, never on a caller's scope. Calling
    /// it while the same task holds an open write scope waits out the busy
    /// timeout and fails with `DbError::Busy`.
    pub async fn upsert(&self, input: &ProductTypeInput) -> DbResult<ProductType> {
        let mut saved = self.upsert_many(std::slice::from_ref(input)).await?;
        saved
            .pop()
            .ok_or_else(|| DbError::Internal("product type upsert returned no row".to_string()))
    }

    /// Upserts several types in one private transaction. All or nothing.
    pub async fn upsert_many(&self, inputs: &[ProductTypeInput]) -> DbResult<Vec<ProductType>> {
        for input in inputs {
            validate_name("name", &input.name)?;
        }

        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = inputs.len(), "Upserting product types");

        let mut scope = TxScope::new(self.pool.clone());
        let owned = scope.begin_if_needed().await?;
        let result = save_types(&mut scope, inputs).await;
        scope.settle(owned, result).await
    }
}

async fn save_types(scope: &mut TxScope, inputs: &[ProductTypeInput]) -> DbResult<Vec<ProductType>> {
    let conn = scope.connection()?;
    let mut saved = Vec::with_capacity(inputs.len());

    for input in inputs {
        saved.push(save_type(conn, input).await?);
    }

    Ok(saved)
}

async fn save_type(conn: &mut SqliteConnection, input: &ProductTypeInput) -> DbResult<ProductType> {
    let now = Utc::now();
    let name = input.name.trim();

    let product_type = sqlx::query_as::<_, ProductType>(
        r#"
        INSERT INTO product_types (id, category_id, name, name_key, is_active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        ON CONFLICT (id) DO UPDATE SET
            category_id = excluded.category_id,
            name = excluded.name,
            name_key = excluded.name_key,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at
        RETURNING id, category_id, name, is_active, created_at, updated_at
        "#,
    )
    .bind(input.id)
    .bind(input.category_id)
    .bind(name)
    .bind(name_key(name))
    .bind(input.is_active)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| DbError::from_write(e, name))?;

    // A type that moves category drags its products' relations along.
    sqlx::query(
        r#"
        UPDATE product_category_relations
        SET category_id = ?2
        WHERE product_id IN (SELECT id FROM products WHERE product_type_id = ?1)
        "#,
    )
    .bind(product_type.id)
    .bind(product_type.category_id)
    .execute(&mut *conn)
    .await?;

    Ok(product_type)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::CategoryInput;
    use crate::test_support::{seed_catalog, seed_product, test_db};

    #[tokio::test]
    async fn test_same_name_allowed_in_different_categories() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.product_types();

        repo.upsert(&ProductTypeInput::new(catalog.toys.id, "Fruit"))
            .await
            .unwrap();

        let err = repo
            .upsert(&ProductTypeInput::new(catalog.food.id, "fruit"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_missing_category_is_foreign_key_violation() {
        let db = test_db().await;
        let err = db
            .product_types()
            .upsert(&ProductTypeInput::new(777, "Orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_lookups_and_listing() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let repo = db.product_types();

        let mut retired = ProductTypeInput::new(catalog.food.id, "Bread");
        retired.is_active = false;
        let bread = repo.upsert(&retired).await.unwrap();

        assert_eq!(repo.get(catalog.fruit.id).await.unwrap().name, "Fruit");
        assert!(repo.get(31_337).await.unwrap_err().is_not_found());
        assert_eq!(
            repo.get_by_name("PLUSH").await.unwrap().map(|t| t.id),
            Some(catalog.plush.id)
        );
        assert_eq!(
            repo.get_by_ids(&[bread.id, catalog.fruit.id]).await.unwrap().len(),
            2
        );

        let food_active: Vec<_> = repo
            .list_for_category(catalog.food.id, false)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(food_active, ["Fruit"]);

        let food_all: Vec<_> = repo
            .list_for_category(catalog.food.id, true)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(food_all, ["Bread", "Fruit"]);

        let everything: Vec<_> = repo.list(true).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(everything, ["Bread", "Fruit", "Plush"]);
    }

    #[tokio::test]
    async fn test_moving_type_moves_product_relations() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        seed_product(&db, &catalog, "Apple", true).await;

        let garden = db
            .categories()
            .upsert(&CategoryInput::new("Garden"))
            .await
            .unwrap();

        let mut moved = ProductTypeInput::new(garden.id, "Fruit");
        moved.id = Some(catalog.fruit.id);
        db.product_types().upsert(&moved).await.unwrap();

        let names: Vec<_> = db
            .categories()
            .categories_for_store(catalog.store.id, true)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Garden"]);
    }
}
