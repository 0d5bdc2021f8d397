//! # Demo Catalog Seeder
//!
//! Populates a database with one demo store and a small catalog for
//! development.
//!
//! ## Usage
//! ```bash
//! # Use CATALOG_DB_PATH (default ./catalog.db)
//! cargo run -p catalog-db --bin seed
//!
//! # Specify database path
//! cargo run -p catalog-db --bin seed -- --db ./data/catalog.db
//!
//! # More logging
//! RUST_LOG=debug cargo run -p catalog-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Store "Demo Market" with weekday hours and a few tags
//! - Categories: Beverages, Snacks, Produce, Seasonal (inactive)
//! - One or two product types per category
//! - Units: Piece, Kilogram, Litre
//! - Products with a primary image each; one product deactivated
//!
//! Running it twice is harmless: an existing "Demo Market" is left alone.

use std::env;

use catalog_core::{
    CategoryInput, ImageType, Money, Product, ProductImage, ProductTypeInput, Store, StoreHours,
    UnitOfMeasureInput,
};
use catalog_db::{Database, DbConfig, ProductListQuery};
use chrono::NaiveTime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const STORE_NAME: &str = "Demo Market";

/// (product, price, unit, on_sale)
type ProductSeed = (&'static str, &'static str, &'static str, bool);
type TypeSeed = (&'static str, &'static [ProductSeed]);

/// (category, active, [(type, products)])
const CATALOG: &[(&str, bool, &[TypeSeed])] = &[
    (
        "Beverages",
        true,
        &[
            (
                "Soft Drinks",
                &[
                    ("Cola 330ml", "1.49", "Piece", true),
                    ("Lemon Soda 330ml", "1.29", "Piece", true),
                    ("Ginger Ale 330ml", "1.59", "Piece", false),
                ],
            ),
            (
                "Water",
                &[
                    ("Still Water 1.5L", "0.89", "Litre", true),
                    ("Sparkling Water 1L", "0.99", "Litre", true),
                ],
            ),
        ],
    ),
    (
        "Snacks",
        true,
        &[(
            "Chips",
            &[
                ("Salted Chips 150g", "2.19", "Piece", true),
                ("Paprika Chips 150g", "2.29", "Piece", true),
            ],
        )],
    ),
    (
        "Produce",
        true,
        &[(
            "Fruit",
            &[
                ("Apples", "2.99", "Kilogram", true),
                ("Bananas", "1.79", "Kilogram", true),
            ],
        )],
    ),
    (
        "Seasonal",
        false,
        &[("Holiday", &[("Gingerbread Box", "6.49", "Piece", true)])],
    ),
];

const UNITS: &[(&str, &str)] = &[("Piece", "pcs"), ("Kilogram", "kg"), ("Litre", "l")];

const TAGS: &[&str] = &["family-owned", "local", "organic"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = DbConfig::from_env()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Catalog Demo Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $CATALOG_DB_PATH or ./catalog.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding demo catalog");

    let db = Database::new(config.run_migrations(true)).await?;

    if let Some(existing) = db.stores().get_store_by_name(STORE_NAME).await? {
        let products = db.products().count(existing.id).await?;
        warn!(
            store_id = %existing.id,
            products,
            "Demo store already exists, skipping seed (delete the database file to regenerate)"
        );
        return Ok(());
    }

    let store = seed_store(&db).await?;
    let created = seed_catalog(&db, &store).await?;

    info!(store_id = %store.id, products = created, "Demo catalog created");

    summarize(&db, &store).await?;

    db.close().await;
    Ok(())
}

/// Log filter from `RUST_LOG`, defaulting to `info` with quiet sqlx.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,catalog_db=info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn seed_store(db: &Database) -> Result<Store, Box<dyn std::error::Error>> {
    let mut store = Store::new(STORE_NAME);
    store.description = Some("Neighbourhood grocery used for demos".to_string());
    let store = db.stores().create_store(&store).await?;

    let open = NaiveTime::from_hms_opt(8, 0, 0).ok_or("invalid opening time")?;
    let close = NaiveTime::from_hms_opt(20, 0, 0).ok_or("invalid closing time")?;
    // Monday to Saturday
    let hours: Vec<StoreHours> = (0..6)
        .map(|day| StoreHours::new(store.id, day, open, close))
        .collect();
    let tags: Vec<String> = TAGS.iter().map(|t| t.to_string()).collect();

    let mut scope = db.scope();
    db.stores().update_store(&mut scope, &store, &hours, &tags).await?;

    info!(store_id = %store.id, days = hours.len(), tags = tags.len(), "Store created");
    Ok(store)
}

async fn seed_catalog(db: &Database, store: &Store) -> Result<usize, Box<dyn std::error::Error>> {
    let unit_inputs: Vec<UnitOfMeasureInput> = UNITS
        .iter()
        .map(|(name, symbol)| UnitOfMeasureInput::new(*name, *symbol))
        .collect();
    let units = db.units().upsert_many(&unit_inputs).await?;

    let mut products = Vec::new();

    for (category_name, active, types) in CATALOG {
        let mut input = CategoryInput::new(*category_name);
        input.is_active = *active;
        let category = db.categories().upsert(&input).await?;

        for (type_name, items) in *types {
            let product_type = db
                .product_types()
                .upsert(&ProductTypeInput::new(category.id, *type_name))
                .await?;

            for (name, price, unit_name, on_sale) in *items {
                let unit = units
                    .iter()
                    .find(|u| u.name == *unit_name)
                    .ok_or_else(|| format!("unknown unit {unit_name}"))?;

                let mut product = Product::new(
                    store.id,
                    *name,
                    Money::parse_decimal(price)?,
                    unit.id,
                    product_type.id,
                );
                product.sale_status = *on_sale;
                product.stock = 24;
                products.push(product);
            }
        }
    }

    let images: Vec<ProductImage> = products
        .iter()
        .map(|p| {
            let slug = p.name.to_ascii_lowercase().replace(' ', "-");
            ProductImage::new(
                p.id,
                ImageType::Primary,
                format!("https://images.example.com/demo/{slug}.jpg"),
            )
        })
        .collect();

    // Products and their images land in one transaction.
    let mut scope = db.scope();
    scope.begin_if_needed().await?;
    let written = match write_products(db, &mut scope, &products, &images).await {
        Ok(written) => written,
        Err(err) => {
            scope.rollback().await?;
            return Err(err.into());
        }
    };
    scope.commit().await?;

    Ok(written)
}

async fn write_products(
    db: &Database,
    scope: &mut catalog_db::TxScope,
    products: &[Product],
    images: &[ProductImage],
) -> catalog_db::DbResult<usize> {
    let saved = db.products().upsert_products(scope, products).await?;
    db.images().upsert_images(scope, images).await?;
    Ok(saved.len())
}

async fn summarize(db: &Database, store: &Store) -> Result<(), Box<dyn std::error::Error>> {
    let page = db
        .products()
        .list_products(ProductListQuery::for_store(store.id).order_by("price", "desc").page(1, 5))
        .await?;

    info!(
        total = page.pagination.total_records,
        pages = page.pagination.total_pages,
        "On-sale products"
    );
    for view in &page.products {
        info!(
            name = %view.product.name,
            price = %view.product.price(),
            category = %view.product_category_name,
            product_type = %view.product_type_name,
            "  product"
        );
    }

    let categories = db.categories().categories_for_store(store.id, false).await?;
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    info!(categories = ?names, "Active categories in use");

    let all = db.categories().categories_for_store(store.id, true).await?;
    info!(count = all.len(), "Categories in use including inactive");

    Ok(())
}
