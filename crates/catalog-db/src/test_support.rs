//! Fixtures shared by the repository tests.

use catalog_core::{
    CategoryInput, Money, Product, ProductCategory, ProductType, ProductTypeInput, Store,
    UnitOfMeasure, UnitOfMeasureInput,
};

use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

use crate::config::DbConfig;
use crate::pool::Database;

/// Fresh in-memory database with migrations applied.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database should open")
}

/// File-backed database in the temp dir, for tests that need more than one
/// connection. The files are removed on drop.
pub(crate) struct FileDb {
    pub db: Database,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

pub(crate) async fn file_db(busy_timeout: Duration) -> FileDb {
    let path = std::env::temp_dir().join(format!("catalog-test-{}.db", Uuid::new_v4()));
    let db = Database::new(DbConfig::new(path.clone()).busy_timeout(busy_timeout))
        .await
        .expect("file database should open");
    FileDb { db, path }
}

/// A store with two categories (Food active, Toys inactive), one type in
/// each, and one unit.
pub(crate) struct Catalog {
    pub store: Store,
    pub food: ProductCategory,
    pub toys: ProductCategory,
    pub fruit: ProductType,
    pub plush: ProductType,
    pub unit: UnitOfMeasure,
}

pub(crate) async fn seed_store(db: &Database, name: &str) -> Store {
    let store = Store::new(name);
    db.stores()
        .create_store(&store)
        .await
        .expect("store should insert");
    store
}

pub(crate) async fn seed_catalog(db: &Database) -> Catalog {
    let store = seed_store(db, "Corner Shop").await;

    let categories = db.categories();
    let food = categories
        .upsert(&CategoryInput::new("Food"))
        .await
        .expect("Food should insert");
    let mut toys_input = CategoryInput::new("Toys");
    toys_input.is_active = false;
    let toys = categories
        .upsert(&toys_input)
        .await
        .expect("Toys should insert");

    let types = db.product_types();
    let fruit = types
        .upsert(&ProductTypeInput::new(food.id, "Fruit"))
        .await
        .expect("Fruit should insert");
    let plush = types
        .upsert(&ProductTypeInput::new(toys.id, "Plush"))
        .await
        .expect("Plush should insert");

    let unit = db
        .units()
        .upsert(&UnitOfMeasureInput::new("Piece", "pcs"))
        .await
        .expect("unit should insert");

    Catalog {
        store,
        food,
        toys,
        fruit,
        plush,
        unit,
    }
}

/// Inserts one product of type Fruit in the catalog's store.
pub(crate) async fn seed_product(db: &Database, catalog: &Catalog, name: &str, on_sale: bool) -> Product {
    seed_typed_product(db, catalog, &catalog.fruit, name, 100, on_sale).await
}

pub(crate) async fn seed_typed_product(
    db: &Database,
    catalog: &Catalog,
    product_type: &ProductType,
    name: &str,
    price_cents: i64,
    on_sale: bool,
) -> Product {
    let mut product = Product::new(
        catalog.store.id,
        name,
        Money::from_cents(price_cents),
        catalog.unit.id,
        product_type.id,
    );
    product.sale_status = on_sale;

    let mut scope = db.scope();
    scope.begin_if_needed().await.expect("begin");
    db.products()
        .upsert_products(&mut scope, std::slice::from_ref(&product))
        .await
        .expect("product should upsert");
    scope.commit().await.expect("commit");

    product
}
