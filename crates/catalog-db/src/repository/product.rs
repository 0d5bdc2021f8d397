//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Joined reads that come back as [`ProductView`] (type and category names
//!   filled in, images attached)
//! - Paginated listing with whitelisted sorting ([`ProductListQuery`])
//! - Upserts inside a caller-opened [`TxScope`]
//! - Hard deletes (images and category relations cascade)
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Product Is Read                                │
//! │                                                                         │
//! │  products p ⋈ product_types t ⋈ product_categories c                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductRow { product, product_type_name, product_category_* }         │
//! │       │                                                                 │
//! │       │  + SELECT ... FROM product_images WHERE product_id IN (...)    │
//! │       ▼                                                                 │
//! │  project() → ProductView                                               │
//! │                                                                         │
//! │  Denormalized fields are never written back; products stores ids only. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Not Found
//! `get_product` is a required fetch and fails with `DbError::NotFound`.
//! Name lookups return `None`; collection lookups and listings return an
//! empty result.

use catalog_core::validation::{name_key, validate_product, validate_search_query};
use catalog_core::{compute_pagination, Product, ProductSort, ProductView};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::image::fetch_for_products;
use crate::repository::product_query::{
    classify_list_error, project, push_filters, select_products, ProductListQuery, ProductPage,
    ProductRow, PRODUCT_FROM,
};
use crate::repository::push_in_list;
use crate::transaction::TxScope;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let view = repo.get_product(id).await?;
/// let page = repo.list_products(ProductListQuery::for_store(store_id)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a product with its joined fields and images.
    ///
    /// ## Returns
    /// * `Ok(ProductView)` - Product found
    /// * `Err(DbError::NotFound)` - No product with this id
    pub async fn get_product(&self, id: Uuid) -> DbResult<ProductView> {
        debug!(id = %id, "Fetching product");

        let mut builder = select_products();
        builder.push(" WHERE p.id = ").push_bind(id);

        let row = builder
            .build_query_as::<ProductRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let mut views = self.attach_images(vec![row]).await?;
        views
            .pop()
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Case-insensitive lookup of a product by name inside one store.
    pub async fn get_product_by_name(
        &self,
        store_id: Uuid,
        name: &str,
    ) -> DbResult<Option<ProductView>> {
        let mut builder = select_products();
        builder
            .push(" WHERE p.store_id = ")
            .push_bind(store_id)
            .push(" AND p.name_key = ")
            .push_bind(name_key(name));

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(self.attach_images(rows).await?.pop())
    }

    /// Products with the given ids, ordered by name. Unknown ids are skipped.
    pub async fn get_products_by_ids(&self, ids: &[Uuid]) -> DbResult<Vec<ProductView>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = select_products();
        builder.push(" WHERE p.id IN ");
        push_in_list(&mut builder, ids);
        builder.push(" ORDER BY p.name ASC, p.id ASC");

        self.fetch_views(builder).await
    }

    /// Products of one store matching any of the names (case-insensitive).
    pub async fn get_products_by_names(
        &self,
        store_id: Uuid,
        names: &[String],
    ) -> DbResult<Vec<ProductView>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = names.iter().map(|n| name_key(n)).collect();

        let mut builder = select_products();
        builder
            .push(" WHERE p.store_id = ")
            .push_bind(store_id)
            .push(" AND p.name_key IN ");
        push_in_list(&mut builder, &keys);
        builder.push(" ORDER BY p.name ASC, p.id ASC");

        self.fetch_views(builder).await
    }

    /// Products of one type in a store, ordered by name.
    pub async fn products_by_type(
        &self,
        store_id: Uuid,
        product_type_id: i64,
        include_deactivated: bool,
    ) -> DbResult<Vec<ProductView>> {
        let mut builder = select_products();
        builder
            .push(" WHERE p.store_id = ")
            .push_bind(store_id)
            .push(" AND p.product_type_id = ")
            .push_bind(product_type_id);
        if !include_deactivated {
            builder.push(" AND p.sale_status = 1");
        }
        builder.push(" ORDER BY p.name ASC, p.id ASC");

        self.fetch_views(builder).await
    }

    /// Products of one category in a store, ordered by name.
    pub async fn products_by_category(
        &self,
        store_id: Uuid,
        category_id: i64,
        include_deactivated: bool,
    ) -> DbResult<Vec<ProductView>> {
        let mut builder = select_products();
        builder
            .push(" WHERE p.store_id = ")
            .push_bind(store_id)
            .push(" AND c.id = ")
            .push_bind(category_id);
        if !include_deactivated {
            builder.push(" AND p.sale_status = 1");
        }
        builder.push(" ORDER BY p.name ASC, p.id ASC");

        self.fetch_views(builder).await
    }

    /// Paginated, filtered, sorted listing.
    ///
    /// ## How It Works
    /// 1. Sort and search input are validated; a sort outside the whitelist
    ///    fails here and never reaches the database
    /// 2. `COUNT(*)` with the same filters gives `total_records`
    /// 3. The page is fetched with `LIMIT`/`OFFSET` from the normalized request
    /// 4. Images for the page are loaded in one query and attached
    ///
    /// ## Errors
    /// * `DbError::Validation(InvalidSort)` - bad `order_by`/`direction`
    ///
    /// No matching rows is an empty page with `total_records = 0`.
    pub async fn list_products(&self, query: ProductListQuery) -> DbResult<ProductPage> {
        let sort = ProductSort::parse(&query.order_by, &query.direction)?;
        let search = match query.search.as_deref() {
            Some(raw) => validate_search_query(raw)?,
            None => None,
        };

        debug!(
            store_id = %query.store_id,
            product_type_id = ?query.product_type_id,
            include_deactivated = query.include_deactivated,
            sort = %sort.order_clause(),
            page = query.page.normalized_page(),
            limit = query.page.normalized_limit(),
            "Listing products"
        );

        let mut count: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT COUNT(*)");
        count.push(PRODUCT_FROM);
        push_filters(&mut count, &query, search.as_deref());

        let total_records = match count.build_query_scalar::<i64>().fetch_one(&self.pool).await {
            Ok(total) => total,
            Err(err) => return classify_list_error(err, &query),
        };

        let mut select = select_products();
        push_filters(&mut select, &query, search.as_deref());
        select.push(" ORDER BY ").push(sort.order_clause());
        select
            .push(" LIMIT ")
            .push_bind(query.page.normalized_limit())
            .push(" OFFSET ")
            .push_bind(query.page.offset());

        let rows = match select.build_query_as::<ProductRow>().fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(err) => return classify_list_error(err, &query),
        };

        let returned = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        let products = self.attach_images(rows).await?;

        debug!(count = products.len(), total_records, "Listing returned products");

        Ok(ProductPage {
            products,
            pagination: compute_pagination(query.page.page, query.page.limit, total_records, returned),
        })
    }

    /// Counts a store's products, deactivated ones included.
    pub async fn count(&self, store_id: Uuid) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE store_id = ?1")
            .bind(store_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts or updates products by id inside the caller's transaction.
    ///
    /// ## Contract
    /// - The scope must already be open; this never begins or commits
    /// - Images are not written (see `ImageRepository`)
    /// - `product_category_relations` follows the category of each
    ///   product's type
    /// - `created_at` of an existing row is kept
    ///
    /// ## Errors
    /// * `DbError::NoActiveTransaction` - scope is idle
    /// * `DbError::Validation` - empty/long name, negative price
    /// * `DbError::UniqueViolation` - name taken in the store (any case)
    /// * `DbError::ForeignKeyViolation` - unknown store, type or unit
    pub async fn upsert_products(
        &self,
        scope: &mut TxScope,
        products: &[Product],
    ) -> DbResult<Vec<Product>> {
        for product in products {
            validate_product(product)?;
        }

        let conn = scope.connection()?;

        debug!(count = products.len(), "Upserting products");

        let mut saved = Vec::with_capacity(products.len());
        for product in products {
            saved.push(save_product(conn, product).await?);
        }

        Ok(saved)
    }

    /// Hard-deletes products of one store. Returns rows deleted.
    ///
    /// Ids from other stores are ignored. Owner pattern: opens and settles
    /// its own transaction unless the caller already has one open.
    pub async fn delete_products(
        &self,
        scope: &mut TxScope,
        store_id: Uuid,
        ids: &[Uuid],
    ) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        debug!(store_id = %store_id, count = ids.len(), "Deleting products");

        let owned = scope.begin_if_needed().await?;
        let result = remove_products(scope, store_id, ids).await;
        scope.settle(owned, result).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn fetch_views(&self, mut builder: QueryBuilder<'_, Sqlite>) -> DbResult<Vec<ProductView>> {
        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_images(rows).await
    }

    async fn attach_images(&self, rows: Vec<ProductRow>) -> DbResult<Vec<ProductView>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.product.id).collect();
        let images = fetch_for_products(&self.pool, &ids).await?;
        Ok(project(rows, images))
    }
}

async fn save_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<Product> {
    let name = product.name.trim();

    let saved = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (
            id, store_id, name, name_key, sale_status, price_cents, stock,
            unit_of_measure_id, product_type_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT (id) DO UPDATE SET
            store_id = excluded.store_id,
            name = excluded.name,
            name_key = excluded.name_key,
            sale_status = excluded.sale_status,
            price_cents = excluded.price_cents,
            stock = excluded.stock,
            unit_of_measure_id = excluded.unit_of_measure_id,
            product_type_id = excluded.product_type_id,
            updated_at = excluded.updated_at
        RETURNING id, store_id, name, sale_status, price_cents, stock,
                  unit_of_measure_id, product_type_id, created_at, updated_at
        "#,
    )
    .bind(product.id)
    .bind(product.store_id)
    .bind(name)
    .bind(name_key(name))
    .bind(product.sale_status)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(product.unit_of_measure_id)
    .bind(product.product_type_id)
    .bind(product.created_at)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| DbError::from_write(e, name))?;

    // Relations mirror the type's category: drop stale ones, add the current one.
    sqlx::query(
        r#"
        DELETE FROM product_category_relations
        WHERE product_id = ?1
          AND category_id <> (SELECT category_id FROM product_types WHERE id = ?2)
        "#,
    )
    .bind(saved.id)
    .bind(saved.product_type_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT OR IGNORE INTO product_category_relations (product_id, category_id)
        SELECT ?1, category_id FROM product_types WHERE id = ?2
        "#,
    )
    .bind(saved.id)
    .bind(saved.product_type_id)
    .execute(&mut *conn)
    .await?;

    Ok(saved)
}

async fn remove_products(scope: &mut TxScope, store_id: Uuid, ids: &[Uuid]) -> DbResult<u64> {
    let conn = scope.connection()?;

    let mut builder: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("DELETE FROM products WHERE store_id = ");
    builder.push_bind(store_id);
    builder.push(" AND id IN ");
    push_in_list(&mut builder, ids);

    let result = builder.build().execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_catalog, seed_product, seed_store, seed_typed_product, test_db};
    use catalog_core::{ImageType, Money, ProductImage, ValidationError};

    fn names(views: &[ProductView]) -> Vec<&str> {
        views.iter().map(|v| v.product.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_round_trip_fills_denormalized_fields() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let product = seed_product(&db, &catalog, "Apple", true).await;

        let view = db.products().get_product(product.id).await.unwrap();

        assert_eq!(view.product.id, product.id);
        assert_eq!(view.product.price(), Money::from_cents(100));
        assert_eq!(view.product_type_name, "Fruit");
        assert_eq!(view.product_category_id, catalog.food.id);
        assert_eq!(view.product_category_name, "Food");
        assert!(view.images.is_empty());
    }

    #[tokio::test]
    async fn test_get_product_attaches_images() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let product = seed_product(&db, &catalog, "Apple", true).await;

        let image = ProductImage::new(product.id, ImageType::Primary, "https://cdn.example.com/a.png");
        let mut scope = db.scope();
        db.images().upsert_images(&mut scope, &[image.clone()]).await.unwrap();

        let view = db.products().get_product(product.id).await.unwrap();
        assert_eq!(view.images.len(), 1);
        assert_eq!(view.images[0].id, image.id);
    }

    #[tokio::test]
    async fn test_get_product_missing_is_not_found() {
        let db = test_db().await;
        let err = db.products().get_product(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_upsert_requires_open_scope() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let product = Product::new(
            catalog.store.id,
            "Apple",
            Money::from_cents(100),
            catalog.unit.id,
            catalog.fruit.id,
        );

        let mut scope = db.scope();
        let err = db
            .products()
            .upsert_products(&mut scope, &[product])
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NoActiveTransaction));
        assert_eq!(db.products().count(catalog.store.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_updates_and_keeps_images() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let mut product = seed_product(&db, &catalog, "Apple", true).await;

        let image = ProductImage::new(product.id, ImageType::Primary, "https://cdn.example.com/a.png");
        let mut scope = db.scope();
        db.images().upsert_images(&mut scope, &[image]).await.unwrap();

        product.price_cents = 250;
        product.stock = -3;
        scope.begin_if_needed().await.unwrap();
        let saved = db
            .products()
            .upsert_products(&mut scope, &[product.clone()])
            .await
            .unwrap();
        scope.commit().await.unwrap();

        assert_eq!(saved[0].price_cents, 250);

        let view = db.products().get_product(product.id).await.unwrap();
        assert_eq!(view.product.price_cents, 250);
        assert_eq!(view.product.stock, -3);
        assert_eq!(view.images.len(), 1);
        assert_eq!(db.products().count(catalog.store.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_changing_type_moves_category_relation() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let mut product = seed_product(&db, &catalog, "Apple", true).await;

        product.product_type_id = catalog.plush.id;
        let mut scope = db.scope();
        scope.begin_if_needed().await.unwrap();
        db.products()
            .upsert_products(&mut scope, &[product.clone()])
            .await
            .unwrap();
        scope.commit().await.unwrap();

        let categories = db
            .categories()
            .categories_for_store(catalog.store.id, true)
            .await
            .unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, catalog.toys.id);

        let view = db.products().get_product(product.id).await.unwrap();
        assert_eq!(view.product_category_name, "Toys");
    }

    #[tokio::test]
    async fn test_duplicate_name_per_store() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        seed_product(&db, &catalog, "Apple", true).await;

        let duplicate = Product::new(
            catalog.store.id,
            "APPLE",
            Money::from_cents(1),
            catalog.unit.id,
            catalog.fruit.id,
        );
        let mut scope = db.scope();
        scope.begin_if_needed().await.unwrap();
        let err = db
            .products()
            .upsert_products(&mut scope, &[duplicate])
            .await
            .unwrap_err();
        scope.rollback().await.unwrap();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "APPLE"));

        // Same name in another store is fine.
        let other = seed_store(&db, "Other Shop").await;
        let elsewhere = Product::new(other.id, "Apple", Money::from_cents(1), catalog.unit.id, catalog.fruit.id);
        scope.begin_if_needed().await.unwrap();
        db.products()
            .upsert_products(&mut scope, &[elsewhere])
            .await
            .unwrap();
        scope.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_ascii_names_collide_case_insensitively() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let product = |name: &str| {
            Product::new(
                catalog.store.id,
                name,
                Money::from_cents(250),
                catalog.unit.id,
                catalog.fruit.id,
            )
        };

        let mut scope = db.scope();
        scope.begin_if_needed().await.unwrap();
        let err = db
            .products()
            .upsert_products(&mut scope, &[product("Äpfel"), product("äpfel")])
            .await
            .unwrap_err();
        scope.rollback().await.unwrap();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "äpfel"));

        let apfel = seed_product(&db, &catalog, "Äpfel", true).await;
        let repo = db.products();
        let found = repo.get_product_by_name(catalog.store.id, "ÄPFEL").await.unwrap();
        assert_eq!(found.map(|v| v.product.id), Some(apfel.id));

        let by_names = repo
            .get_products_by_names(catalog.store.id, &["äpfel".to_string()])
            .await
            .unwrap();
        assert_eq!(by_names.len(), 1);

        let page = repo
            .list_products(ProductListQuery::for_store(catalog.store.id).search("ÄPF"))
            .await
            .unwrap();
        assert_eq!(page.products.len(), 1);
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let mut product = Product::new(
            catalog.store.id,
            "Apple",
            Money::zero(),
            catalog.unit.id,
            catalog.fruit.id,
        );
        product.price_cents = -1;

        let mut scope = db.scope();
        scope.begin_if_needed().await.unwrap();
        let err = db
            .products()
            .upsert_products(&mut scope, &[product])
            .await
            .unwrap_err();
        scope.rollback().await.unwrap();

        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_name_and_collection_lookups() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let apple = seed_product(&db, &catalog, "Apple", true).await;
        let pear = seed_product(&db, &catalog, "Pear", false).await;
        let repo = db.products();

        let found = repo.get_product_by_name(catalog.store.id, "aPPLE").await.unwrap();
        assert_eq!(found.map(|v| v.product.id), Some(apple.id));
        assert!(repo.get_product_by_name(catalog.store.id, "Plum").await.unwrap().is_none());

        let by_ids = repo
            .get_products_by_ids(&[pear.id, apple.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(names(&by_ids), ["Apple", "Pear"]);
        assert!(repo.get_products_by_ids(&[]).await.unwrap().is_empty());

        let by_names = repo
            .get_products_by_names(catalog.store.id, &["PEAR".to_string(), "Plum".to_string()])
            .await
            .unwrap();
        assert_eq!(names(&by_names), ["Pear"]);
        assert!(repo.get_products_by_names(catalog.store.id, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_products_by_type_and_category() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        seed_typed_product(&db, &catalog, &catalog.fruit, "Pear", 90, true).await;
        seed_typed_product(&db, &catalog, &catalog.fruit, "Apple", 120, false).await;
        seed_typed_product(&db, &catalog, &catalog.plush, "Teddy", 1500, true).await;
        let repo = db.products();

        let fruit = repo
            .products_by_type(catalog.store.id, catalog.fruit.id, false)
            .await
            .unwrap();
        assert_eq!(names(&fruit), ["Pear"]);

        let fruit_all = repo
            .products_by_type(catalog.store.id, catalog.fruit.id, true)
            .await
            .unwrap();
        assert_eq!(names(&fruit_all), ["Apple", "Pear"]);

        let toys = repo
            .products_by_category(catalog.store.id, catalog.toys.id, false)
            .await
            .unwrap();
        assert_eq!(names(&toys), ["Teddy"]);
    }

    #[tokio::test]
    async fn test_list_respects_deactivated_flag() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        seed_product(&db, &catalog, "A", true).await;
        seed_product(&db, &catalog, "B", false).await;
        let repo = db.products();

        let active = repo
            .list_products(ProductListQuery::for_store(catalog.store.id))
            .await
            .unwrap();
        assert_eq!(names(&active.products), ["A"]);
        assert_eq!(active.pagination.total_records, 1);

        let all = repo
            .list_products(ProductListQuery::for_store(catalog.store.id).include_deactivated(true))
            .await
            .unwrap();
        assert_eq!(names(&all.products), ["A", "B"]);
        assert_eq!(all.products[0].product_type_name, "Fruit");
    }

    #[tokio::test]
    async fn test_list_sorting_and_rejection() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        seed_typed_product(&db, &catalog, &catalog.fruit, "Cheap", 10, true).await;
        seed_typed_product(&db, &catalog, &catalog.fruit, "Pricey", 999, true).await;
        seed_typed_product(&db, &catalog, &catalog.fruit, "Middle", 500, true).await;
        let repo = db.products();

        let by_price = repo
            .list_products(ProductListQuery::for_store(catalog.store.id).order_by("price", "DESC"))
            .await
            .unwrap();
        assert_eq!(names(&by_price.products), ["Pricey", "Middle", "Cheap"]);

        let err = repo
            .list_products(ProductListQuery::for_store(catalog.store.id).order_by("name; DROP TABLE products", "asc"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::InvalidSort { .. })
        ));
        assert_eq!(
            err.to_string(),
            "Validation failed: invalid orderBy or direction: name; DROP TABLE products asc"
        );

        // Table is untouched.
        assert_eq!(repo.count(catalog.store.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        for name in ["P1", "P2", "P3", "P4", "P5"] {
            seed_product(&db, &catalog, name, true).await;
        }

        let page = db
            .products()
            .list_products(ProductListQuery::for_store(catalog.store.id).page(3, 2))
            .await
            .unwrap();

        assert_eq!(names(&page.products), ["P5"]);
        assert_eq!(page.pagination.offset, 4);
        assert_eq!(page.pagination.total_records, 5);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.records, 5);

        let defaults = db
            .products()
            .list_products(ProductListQuery::for_store(catalog.store.id).page(0, -1))
            .await
            .unwrap();
        assert_eq!(defaults.pagination.page, 1);
        assert_eq!(defaults.pagination.limit, 10);
        assert_eq!(defaults.products.len(), 5);
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let db = test_db().await;
        let store = seed_store(&db, "Empty").await;

        let page = db
            .products()
            .list_products(ProductListQuery::for_store(store.id))
            .await
            .unwrap();

        assert!(page.products.is_empty());
        assert_eq!(page.pagination.total_records, 0);
        assert_eq!(page.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn test_list_type_filter_and_search() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        seed_typed_product(&db, &catalog, &catalog.fruit, "Green Apple", 100, true).await;
        seed_typed_product(&db, &catalog, &catalog.fruit, "Pear", 100, true).await;
        seed_typed_product(&db, &catalog, &catalog.plush, "Apple Plush", 100, true).await;
        let repo = db.products();

        let apples = repo
            .list_products(ProductListQuery::for_store(catalog.store.id).search("APPLE"))
            .await
            .unwrap();
        assert_eq!(names(&apples.products), ["Apple Plush", "Green Apple"]);

        let fruit_apples = repo
            .list_products(
                ProductListQuery::for_store(catalog.store.id)
                    .search("apple")
                    .product_type(catalog.fruit.id),
            )
            .await
            .unwrap();
        assert_eq!(names(&fruit_apples.products), ["Green Apple"]);

        let wildcard = repo
            .list_products(ProductListQuery::for_store(catalog.store.id).search("%"))
            .await
            .unwrap();
        assert!(wildcard.products.is_empty());

        let blank = repo
            .list_products(ProductListQuery::for_store(catalog.store.id).search("   "))
            .await
            .unwrap();
        assert_eq!(blank.pagination.total_records, 3);
    }

    #[tokio::test]
    async fn test_delete_cascades_and_is_store_scoped() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let apple = seed_product(&db, &catalog, "Apple", true).await;
        let pear = seed_product(&db, &catalog, "Pear", true).await;

        let image = ProductImage::new(apple.id, ImageType::Primary, "https://cdn.example.com/a.png");
        let mut scope = db.scope();
        db.images().upsert_images(&mut scope, &[image]).await.unwrap();

        let wrong_store = db
            .products()
            .delete_products(&mut scope, Uuid::new_v4(), &[apple.id])
            .await
            .unwrap();
        assert_eq!(wrong_store, 0);

        let deleted = db
            .products()
            .delete_products(&mut scope, catalog.store.id, &[apple.id])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(!scope.is_active());

        assert!(db.images().images_for_product(apple.id).await.unwrap().is_empty());
        assert_eq!(db.products().count(catalog.store.id).await.unwrap(), 1);
        assert!(db.products().get_product(pear.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_composed_writes_roll_back_together() {
        let db = test_db().await;
        let catalog = seed_catalog(&db).await;
        let product = Product::new(
            catalog.store.id,
            "Apple",
            Money::from_cents(100),
            catalog.unit.id,
            catalog.fruit.id,
        );
        let image = ProductImage::new(product.id, ImageType::Primary, "https://cdn.example.com/a.png");

        let mut scope = db.scope();
        assert!(scope.begin_if_needed().await.unwrap());
        db.products()
            .upsert_products(&mut scope, &[product.clone()])
            .await
            .unwrap();
        db.images().upsert_images(&mut scope, &[image]).await.unwrap();
        assert!(scope.is_active());
        scope.rollback().await.unwrap();

        assert!(db.products().get_product(product.id).await.unwrap_err().is_not_found());
    }
}
