//! # Image Repository
//!
//! Product images are a one-to-many relation persisted on their own:
//! product upserts never touch them.
//!
//! Writes follow the owner pattern. They open a transaction when the
//! caller's scope is idle and then settle it themselves; inside a
//! caller-opened scope they only do their part.

use catalog_core::validation::validate_image;
use catalog_core::ProductImage;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::push_in_list;
use crate::transaction::TxScope;

const IMAGE_COLUMNS: &str = "SELECT id, product_id, image_type, url, created_at FROM product_images";

/// Repository for product images.
#[derive(Debug, Clone)]
pub struct ImageRepository {
    pool: SqlitePool,
}

impl ImageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ImageRepository { pool }
    }

    /// Images of one product, oldest first.
    pub async fn images_for_product(&self, product_id: Uuid) -> DbResult<Vec<ProductImage>> {
        let images = sqlx::query_as::<_, ProductImage>(&format!(
            "{IMAGE_COLUMNS} WHERE product_id = ?1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    /// Images of several products in one query. Empty input → empty vec.
    pub async fn images_for_products(&self, product_ids: &[Uuid]) -> DbResult<Vec<ProductImage>> {
        fetch_for_products(&self.pool, product_ids).await
    }

    /// Inserts or updates images by id.
    ///
    /// Every image is validated before a transaction is opened.
    ///
    /// ## Errors
    /// * `DbError::Validation` - bad URL
    /// * `DbError::ForeignKeyViolation` - product does not exist
    pub async fn upsert_images(
        &self,
        scope: &mut TxScope,
        images: &[ProductImage],
    ) -> DbResult<Vec<ProductImage>> {
        for image in images {
            validate_image(image)?;
        }

        if images.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = images.len(), "Upserting product images");

        let owned = scope.begin_if_needed().await?;
        let result = write_images(scope, images).await;
        scope.settle(owned, result).await
    }

    /// Deletes the listed images of one product.
    ///
    /// Ids belonging to another product are ignored. Returns rows deleted.
    pub async fn delete_images(
        &self,
        scope: &mut TxScope,
        product_id: Uuid,
        image_ids: &[Uuid],
    ) -> DbResult<u64> {
        if image_ids.is_empty() {
            return Ok(0);
        }

        debug!(product_id = %product_id, count = image_ids.len(), "Deleting product images");

        let owned = scope.begin_if_needed().await?;
        let result = remove_images(scope, product_id, image_ids).await;
        scope.settle(owned, result).await
    }
}

/// Shared with the product repository, which attaches images after a fetch.
pub(crate) async fn fetch_for_products(
    pool: &SqlitePool,
    product_ids: &[Uuid],
) -> DbResult<Vec<ProductImage>> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(IMAGE_COLUMNS);
    builder.push(" WHERE product_id IN ");
    push_in_list(&mut builder, product_ids);
    builder.push(" ORDER BY created_at ASC, id ASC");

    let images = builder
        .build_query_as::<ProductImage>()
        .fetch_all(pool)
        .await?;

    Ok(images)
}

async fn write_images(scope: &mut TxScope, images: &[ProductImage]) -> DbResult<Vec<ProductImage>> {
    let conn = scope.connection()?;
    let mut saved = Vec::with_capacity(images.len());

    for image in images {
        let stored = sqlx::query_as::<_, ProductImage>(
            r#"
            INSERT INTO product_images (id, product_id, image_type, url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                product_id = excluded.product_id,
                image_type = excluded.image_type,
                url = excluded.url
            RETURNING id, product_id, image_type, url, created_at
            "#,
        )
        .bind(image.id)
        .bind(image.product_id)
        .bind(image.image_type)
        .bind(image.url.trim())
        .bind(image.created_at)
        .fetch_one(&mut *conn)
        .await?;

        saved.push(stored);
    }

    Ok(saved)
}

async fn remove_images(scope: &mut TxScope, product_id: Uuid, image_ids: &[Uuid]) -> DbResult<u64> {
    let conn = scope.connection()?;

    let mut builder: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("DELETE FROM product_images WHERE product_id = ");
    builder.push_bind(product_id);
    builder.push(" AND id IN ");
    push_in_list(&mut builder, image_ids);

    let result = builder.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

// =============================================================================
// Unit Tests
// =============================================================================
