//! # Unit of Measure Repository
//!
//! Units products are sold in ("Kilogram"/"kg", "Piece"/"pcs"). Names are
//! unique case-insensitively; symbols are not.

use catalog_core::validation::{name_key, validate_name, validate_symbol};
use catalog_core::{UnitOfMeasure, UnitOfMeasureInput};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::push_in_list;
use crate::transaction::TxScope;

const UNIT_COLUMNS: &str =
    "SELECT id, name, symbol, is_active, created_at, updated_at FROM units_of_measure";

/// Repository for units of measure.
#[derive(Debug, Clone)]
pub struct UnitOfMeasureRepository {
    pool: SqlitePool,
}

impl UnitOfMeasureRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UnitOfMeasureRepository { pool }
    }

    /// Gets a unit by id. Absent → `DbError::NotFound`.
    pub async fn get(&self, id: i64) -> DbResult<UnitOfMeasure> {
        sqlx::query_as::<_, UnitOfMeasure>(&format!("{UNIT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("UnitOfMeasure", id))
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<UnitOfMeasure>> {
        let unit = sqlx::query_as::<_, UnitOfMeasure>(&format!(
            "{UNIT_COLUMNS} WHERE name_key = ?1"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    pub async fn get_by_ids(&self, ids: &[i64]) -> DbResult<Vec<UnitOfMeasure>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(UNIT_COLUMNS);
        builder.push(" WHERE id IN ");
        push_in_list(&mut builder, ids);
        builder.push(" ORDER BY name ASC");

        let units = builder
            .build_query_as::<UnitOfMeasure>()
            .fetch_all(&self.pool)
            .await?;

        Ok(units)
    }

    pub async fn list(&self, include_deactivated: bool) -> DbResult<Vec<UnitOfMeasure>> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(UNIT_COLUMNS);
        if !include_deactivated {
            builder.push(" WHERE is_active = 1");
        }
        builder.push(" ORDER BY name ASC");

        let units = builder
            .build_query_as::<UnitOfMeasure>()
            .fetch_all(&self.pool)
            .await?;

        Ok(units)
    }

    /// Inserts (`id: None`) or updates one unit.
    ///
    /// Runs on its own pooled connection, never on a caller's scope. Calling
    /// it while the same task holds an open write scope waits out the busy
    /// timeout and fails with `DbError::Busy`.
    pub async fn upsert(&self, input: &UnitOfMeasureInput) -> DbResult<UnitOfMeasure> {
        let mut saved = self.upsert_many(std::slice::from_ref(input)).await?;
        saved
            .pop()
            .ok_or_else(|| DbError::Internal("unit upsert returned no row".to_string()))
    }

    /// Upserts several units in one private transaction. All or nothing.
    pub async fn upsert_many(&self, inputs: &[UnitOfMeasureInput]) -> DbResult<Vec<UnitOfMeasure>> {
        for input in inputs {
            validate_name("name", &input.name)?;
            validate_symbol(&input.symbol)?;
        }

        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = inputs.len(), "Upserting units of measure");

        let mut scope = TxScope::new(self.pool.clone());
        let owned = scope.begin_if_needed().await?;
        let result = save_units(&mut scope, inputs).await;
        scope.settle(owned, result).await
    }
}

async fn save_units(scope: &mut TxScope, inputs: &[UnitOfMeasureInput]) -> DbResult<Vec<UnitOfMeasure>> {
    let conn = scope.connection()?;
    let mut saved = Vec::with_capacity(inputs.len());

    for input in inputs {
        saved.push(save_unit(conn, input).await?);
    }

    Ok(saved)
}

async fn save_unit(conn: &mut SqliteConnection, input: &UnitOfMeasureInput) -> DbResult<UnitOfMeasure> {
    let name = input.name.trim();

    sqlx::query_as::<_, UnitOfMeasure>(
        r#"
        INSERT INTO units_of_measure (id, name, name_key, symbol, is_active, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            name_key = excluded.name_key,
            symbol = excluded.symbol,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at
        RETURNING id, name, symbol, is_active, created_at, updated_at
        "#,
    )
    .bind(input.id)
    .bind(name)
    .bind(name_key(name))
    .bind(input.symbol.trim())
    .bind(input.is_active)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| DbError::from_write(e, name))
}
