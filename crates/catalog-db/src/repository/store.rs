//! # Store Repository
//!
//! Stores, their weekly opening hours and their tags.
//!
//! ## Store Update Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │          update_store(scope, store, hours, tags)  (owner pattern)      │
//! │                                                                         │
//! │  validate name / hours / tags     ← nothing written if this fails      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  begin_if_needed()                                                     │
//! │       │                                                                 │
//! │  1. UPDATE stores ...              (NotFound if the row is gone)       │
//! │  2. DELETE store_hours  WHERE day_of_week NOT IN (new weekdays)        │
//! │  3. UPSERT store_hours  ON CONFLICT (store_id, day_of_week)            │
//! │  4. DELETE store_tags   WHERE tag NOT IN (new tags)                    │
//! │  5. INSERT OR IGNORE store_tags                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  settle(): owner commits on success, rolls back on any failure         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps run one after another on the transaction's connection; removals
//! always happen before the remaining rows are written.

use std::collections::BTreeSet;

use catalog_core::validation::{name_key, validate_name, validate_store_hours, validate_tags};
use catalog_core::{Store, StoreHours};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::push_in_list;
use crate::transaction::TxScope;

const STORE_COLUMNS: &str = "SELECT id, name, description, is_active, created_at, updated_at FROM stores";

/// Repository for stores.
#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    /// Inserts a new store.
    ///
    /// ## Errors
    /// * `DbError::Validation` - empty or overlong name
    /// * `DbError::UniqueViolation` - name taken (any case)
    pub async fn create_store(&self, store: &Store) -> DbResult<Store> {
        validate_name("name", &store.name)?;

        debug!(id = %store.id, name = %store.name, "Creating store");

        let name = store.name.trim();
        sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (id, name, name_key, description, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, name, description, is_active, created_at, updated_at
            "#,
        )
        .bind(store.id)
        .bind(name)
        .bind(name_key(name))
        .bind(store.description.as_deref())
        .bind(store.is_active)
        .bind(store.created_at)
        .bind(store.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, name))
    }

    /// Gets a store by id. Absent → `DbError::NotFound`.
    pub async fn get_store(&self, id: Uuid) -> DbResult<Store> {
        sqlx::query_as::<_, Store>(&format!("{STORE_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Store", id))
    }

    /// Case-insensitive lookup by name.
    pub async fn get_store_by_name(&self, name: &str) -> DbResult<Option<Store>> {
        let store = sqlx::query_as::<_, Store>(&format!(
            "{STORE_COLUMNS} WHERE name_key = ?1"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(store)
    }

    pub async fn list_stores(&self, include_inactive: bool) -> DbResult<Vec<Store>> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(STORE_COLUMNS);
        if !include_inactive {
            builder.push(" WHERE is_active = 1");
        }
        builder.push(" ORDER BY name ASC");

        let stores = builder
            .build_query_as::<Store>()
            .fetch_all(&self.pool)
            .await?;

        Ok(stores)
    }

    /// Opening hours, Monday first.
    pub async fn store_hours(&self, store_id: Uuid) -> DbResult<Vec<StoreHours>> {
        let hours = sqlx::query_as::<_, StoreHours>(
            r#"
            SELECT id, store_id, day_of_week, opens_at, closes_at
            FROM store_hours
            WHERE store_id = ?1
            ORDER BY day_of_week ASC
            "#,
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(hours)
    }

    /// Tags in alphabetical order.
    pub async fn store_tags(&self, store_id: Uuid) -> DbResult<Vec<String>> {
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT tag FROM store_tags WHERE store_id = ?1 ORDER BY tag ASC")
                .bind(store_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(tags)
    }

    /// Deletes a store together with its hours, tags, products and images.
    pub async fn delete_store(&self, id: Uuid) -> DbResult<()> {
        debug!(id = %id, "Deleting store");

        let result = sqlx::query("DELETE FROM stores WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Store", id));
        }

        Ok(())
    }

    /// Updates a store and reconciles its hours and tags in one transaction.
    ///
    /// `hours` and `tags` are the complete new sets: weekdays and tags not
    /// listed are removed. The `store_id` on each hours entry is ignored in
    /// favour of `store.id`.
    ///
    /// ## Errors
    /// * `DbError::Validation` - bad name, hours or tags (nothing written)
    /// * `DbError::NotFound` - the store does not exist
    /// * `DbError::UniqueViolation` - name taken by another store
    pub async fn update_store(
        &self,
        scope: &mut TxScope,
        store: &Store,
        hours: &[StoreHours],
        tags: &[String],
    ) -> DbResult<Store> {
        validate_name("name", &store.name)?;
        validate_store_hours(hours)?;
        validate_tags(tags)?;

        let tags: Vec<String> = tags
            .iter()
            .map(|t| t.trim().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        debug!(
            id = %store.id,
            hours = hours.len(),
            tags = tags.len(),
            "Updating store"
        );

        let owned = scope.begin_if_needed().await?;
        let result = reconcile_store(scope, store, hours, &tags).await;
        scope.settle(owned, result).await
    }
}

async fn reconcile_store(
    scope: &mut TxScope,
    store: &Store,
    hours: &[StoreHours],
    tags: &[String],
) -> DbResult<Store> {
    let conn = scope.connection()?;

    let updated = update_store_row(conn, store).await?;
    replace_hours(conn, store.id, hours).await?;
    replace_tags(conn, store.id, tags).await?;

    Ok(updated)
}

async fn update_store_row(conn: &mut SqliteConnection, store: &Store) -> DbResult<Store> {
    let name = store.name.trim();

    sqlx::query_as::<_, Store>(
        r#"
        UPDATE stores SET
            name = ?2,
            name_key = ?3,
            description = ?4,
            is_active = ?5,
            updated_at = ?6
        WHERE id = ?1
        RETURNING id, name, description, is_active, created_at, updated_at
        "#,
    )
    .bind(store.id)
    .bind(name)
    .bind(name_key(name))
    .bind(store.description.as_deref())
    .bind(store.is_active)
    .bind(Utc::now())
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| DbError::from_write(e, name))?
    .ok_or_else(|| DbError::not_found("Store", store.id))
}

async fn replace_hours(conn: &mut SqliteConnection, store_id: Uuid, hours: &[StoreHours]) -> DbResult<()> {
    let weekdays: Vec<i64> = hours.iter().map(|h| h.day_of_week).collect();

    let mut removed: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("DELETE FROM store_hours WHERE store_id = ");
    removed.push_bind(store_id);
    if !weekdays.is_empty() {
        removed.push(" AND day_of_week NOT IN ");
        push_in_list(&mut removed, &weekdays);
    }
    removed.build().execute(&mut *conn).await?;

    for entry in hours {
        sqlx::query(
            r#"
            INSERT INTO store_hours (id, store_id, day_of_week, opens_at, closes_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (store_id, day_of_week) DO UPDATE SET
                opens_at = excluded.opens_at,
                closes_at = excluded.closes_at
            "#,
        )
        .bind(entry.id)
        .bind(store_id)
        .bind(entry.day_of_week)
        .bind(entry.opens_at)
        .bind(entry.closes_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn replace_tags(conn: &mut SqliteConnection, store_id: Uuid, tags: &[String]) -> DbResult<()> {
    let mut removed: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("DELETE FROM store_tags WHERE store_id = ");
    removed.push_bind(store_id);
    if !tags.is_empty() {
        removed.push(" AND tag NOT IN ");
        push_in_list(&mut removed, tags);
    }
    removed.build().execute(&mut *conn).await?;

    for tag in tags {
        sqlx::query("INSERT OR IGNORE INTO store_tags (store_id, tag) VALUES (?1, ?2)")
            .bind(store_id)
            .bind(tag)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
