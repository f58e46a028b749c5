//! # Seed Data Generator
//!
//! Populates a database with a demo shop for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p nanotrade-db --bin seed
//!
//! # Specify database path and demo password
//! cargo run -p nanotrade-db --bin seed -- --db ./data/nanotrade.db --password s3cret-pass
//! ```
//!
//! ## Generated Data
//! - Owner account `demo` with a business and one shop
//! - Two warehouses (Douala Central, Bonaberi Depot)
//! - Categories and suppliers
//! - Products with opening stock spread over both warehouses, some of them
//!   deliberately below their reorder level
//! - A couple of customers

use anyhow::{anyhow, Context};
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use std::env;

use nanotrade_core::{
    Address, BusinessContact, BusinessInput, CategoryInput, CustomerInput, InventoryInput,
    Location, ProductInput, RecordStatus, RegisterRequest, ShopInput, SupplierInput, UserRole,
    WarehouseInput,
};
use nanotrade_db::{Database, DbConfig};

/// (category, [(name, sku, price in francs, central stock, depot stock)])
const CATALOG: &[(&str, &[(&str, &str, i64, i64, i64)])] = &[
    (
        "Grains",
        &[
            ("Rice 25kg", "RICE-25KG", 15_000, 40, 60),
            ("Maize Flour 5kg", "MAIZE-5KG", 3_500, 25, 0),
            ("Beans 1kg", "BEANS-1KG", 1_200, 6, 2),
        ],
    ),
    (
        "Oils",
        &[
            ("Palm Oil 5L", "OIL-5L", 6_500, 18, 30),
            ("Groundnut Oil 1L", "GNUT-OIL-1L", 1_800, 4, 0),
        ],
    ),
    (
        "Beverages",
        &[
            ("Mineral Water 1.5L", "WATER-1.5L", 400, 120, 200),
            ("Malt Drink 33cl", "MALT-33CL", 500, 48, 96),
            ("Coffee 250g", "COFFEE-250G", 2_500, 0, 0),
        ],
    ),
    (
        "Household",
        &[
            ("Laundry Soap", "SOAP-400G", 350, 75, 0),
            ("Kerosene Lamp", "LAMP-KERO", 4_000, 3, 5),
        ],
    ),
];

const SUPPLIERS: &[(&str, &str)] = &[
    ("Sodecoton", "sales@sodecoton.cm"),
    ("Brasseries du Cameroun", "orders@sabc.cm"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./nanotrade_dev.db");
    let mut password = String::from("demo-password");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("NanoTrade Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./nanotrade_dev.db)");
                println!("  -p, --password <PASS>    Password of the demo account (default: demo-password)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 NanoTrade Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("opening database")?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.users().count().await? > 0 {
        println!("⚠ Database already has users");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // ----- Owner, business, shop ---------------------------------------------
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("hashing demo password: {e}"))?
        .to_string();

    let owner = db
        .users()
        .create(
            &RegisterRequest {
                username: "demo".to_string(),
                email: "demo@nanotrade.cm".to_string(),
                password: password.clone(),
                role: UserRole::ShopOwner,
                phone_number: Some("+237 699 000 000".to_string()),
                location: Location::default(),
            },
            &hash,
        )
        .await?;

    let business = db
        .businesses()
        .create(
            &owner.id,
            &BusinessInput {
                full_business_name: "Demo Trading SARL".to_string(),
                business_type: "Retail".to_string(),
                address: Address {
                    street: "Boulevard de la Liberté".to_string(),
                    city: "Douala".to_string(),
                    state: "Littoral".to_string(),
                    country: "Cameroon".to_string(),
                    postal_code: "00237".to_string(),
                },
                number_of_employees: 6,
                tax_id_number: "M0000000001".to_string(),
                shop_logo: None,
                taxation_documents: None,
                national_id_card: None,
                contact_info: BusinessContact {
                    phone: "+237 699 000 000".to_string(),
                    email: "contact@nanotrade.cm".to_string(),
                    website: None,
                },
                legal_structure: "SARL".to_string(),
                year_established: 2018,
                industry_category: "Groceries".to_string(),
                annual_revenue_cents: None,
                business_description: "Demo wholesale and retail grocery".to_string(),
            },
        )
        .await?;

    let shop = db
        .shops()
        .create(
            &owner.id,
            &business.id,
            &ShopInput {
                name: "Akwa Branch".to_string(),
                description: "Demo shop".to_string(),
                status: RecordStatus::Active,
                location: Default::default(),
                contact_info: Default::default(),
                operating_hours: Default::default(),
            },
        )
        .await?;

    println!("✓ Owner 'demo' with shop '{}'", shop.name);

    // ----- Warehouses, suppliers ---------------------------------------------
    let mut warehouses = Vec::new();
    for (name, region) in [("Douala Central", "Littoral"), ("Bonaberi Depot", "Littoral")] {
        let warehouse = db
            .warehouses()
            .create(
                &shop.id,
                &WarehouseInput {
                    name: name.to_string(),
                    region: region.to_string(),
                    location: None,
                    capacity: Some(10_000),
                    manager: None,
                    description: None,
                    status: RecordStatus::Active,
                },
            )
            .await?;
        warehouses.push(warehouse);
    }

    let mut supplier_ids = Vec::new();
    for (name, email) in SUPPLIERS {
        let supplier = db
            .suppliers()
            .create(
                &shop.id,
                &SupplierInput {
                    name: name.to_string(),
                    contact_info: None,
                    email: email.to_string(),
                    phone: None,
                    address: None,
                },
            )
            .await?;
        supplier_ids.push(supplier.id);
    }

    println!("✓ {} warehouses, {} suppliers", warehouses.len(), supplier_ids.len());

    // ----- Catalog and stock -------------------------------------------------
    println!();
    println!("Generating catalog...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    for (category_name, products) in CATALOG {
        let category = db
            .categories()
            .create(
                &shop.id,
                &CategoryInput {
                    name: category_name.to_string(),
                    description: None,
                },
                None,
            )
            .await?;

        for (idx, (name, sku, price, central, depot)) in products.iter().enumerate() {
            let input = ProductInput {
                name: name.to_string(),
                sku: Some(sku.to_string()),
                price_cents: price * 100,
                purchase_price_cents: price * 80,
                category_id: Some(category.id.clone()),
                ..Default::default()
            };
            let product = match db.products().create(&shop.id, &input, sku, None).await {
                Ok(product) => product,
                Err(e) => {
                    eprintln!("Failed to insert {}: {}", sku, e);
                    continue;
                }
            };

            for (warehouse, quantity) in warehouses.iter().zip([*central, *depot]) {
                let stock = InventoryInput {
                    product_id: product.id.clone(),
                    warehouse_id: warehouse.id.clone(),
                    quantity,
                    minimum_stock_level: 5,
                    maximum_stock_level: Some(500),
                    batch_number: None,
                    expiration_date: None,
                    notes: None,
                    supplier_id: Some(supplier_ids[idx % supplier_ids.len()].clone()),
                };
                db.inventory().create(&shop.id, &stock, &owner.id).await?;
            }

            generated += 1;
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    // ----- Customers ---------------------------------------------------------
    for (first, last, phone) in [
        ("Ngono", "Marie", "+237 677 00 11 22"),
        ("Tchoua", "Paul", "+237 655 12 34 56"),
    ] {
        db.customers()
            .create(
                &shop.id,
                &CustomerInput {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    phone_number: phone.to_string(),
                    location: Location::default(),
                },
            )
            .await?;
    }

    let reorder = db.inventory().reorder_suggestions(&shop.id).await?;
    println!("  Rows to reorder: {}", reorder.len());

    println!();
    println!("✓ Seed complete! Sign in as 'demo' / '{}'", password);

    Ok(())
}
