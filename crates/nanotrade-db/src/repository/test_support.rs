//! Fixtures shared by the repository tests.

use chrono::NaiveDate;
use nanotrade_core::{
    Address, BusinessContact, BusinessInput, BusinessInformation, Education, EmergencyContact,
    EmployeeInput, EmploymentStatus, Inventory, InventoryInput, Location, Product, ProductInput,
    RecordStatus, RegisterRequest, Shop, ShopInput, User, UserRole, Warehouse, WarehouseInput,
};

use crate::pool::{Database, DbConfig};

pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// A file database in `dir` with a pool of `connections`, for tests where
/// writers race each other.
pub(crate) async fn file_db(dir: &tempfile::TempDir, connections: u32) -> Database {
    let config = DbConfig::new(dir.path().join("shop.db"))
        .max_connections(connections)
        .busy_timeout(std::time::Duration::from_secs(30));
    Database::new(config).await.unwrap()
}

pub(crate) fn register_request(username: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: "longenough".to_string(),
        role: UserRole::ShopOwner,
        phone_number: None,
        location: Location::default(),
    }
}

pub(crate) fn business_input(name: &str) -> BusinessInput {
    BusinessInput {
        full_business_name: name.to_string(),
        business_type: "Retail".to_string(),
        address: Address {
            street: "Rue Joss".to_string(),
            city: "Douala".to_string(),
            state: "Littoral".to_string(),
            country: "Cameroon".to_string(),
            postal_code: "00237".to_string(),
        },
        number_of_employees: 4,
        tax_id_number: "M0123456789".to_string(),
        shop_logo: None,
        taxation_documents: None,
        national_id_card: None,
        contact_info: BusinessContact {
            phone: "+237 699 000 111".to_string(),
            email: "contact@amina.cm".to_string(),
            website: None,
        },
        legal_structure: "SARL".to_string(),
        year_established: 2015,
        industry_category: "Groceries".to_string(),
        annual_revenue_cents: None,
        business_description: String::new(),
    }
}

pub(crate) fn shop_input(name: &str) -> ShopInput {
    ShopInput {
        name: name.to_string(),
        description: String::new(),
        status: RecordStatus::default(),
        location: Default::default(),
        contact_info: Default::default(),
        operating_hours: Default::default(),
    }
}

pub(crate) fn warehouse_input(name: &str) -> WarehouseInput {
    WarehouseInput {
        name: name.to_string(),
        region: "Littoral".to_string(),
        location: None,
        capacity: None,
        manager: None,
        description: None,
        status: RecordStatus::default(),
    }
}

pub(crate) fn product_input(name: &str, price_cents: i64) -> ProductInput {
    ProductInput {
        name: name.to_string(),
        sku: None,
        price_cents,
        purchase_price_cents: price_cents * 4 / 5,
        ..Default::default()
    }
}

pub(crate) fn inventory_input(product_id: &str, warehouse_id: &str, quantity: i64) -> InventoryInput {
    InventoryInput {
        product_id: product_id.to_string(),
        warehouse_id: warehouse_id.to_string(),
        quantity,
        minimum_stock_level: 0,
        maximum_stock_level: None,
        batch_number: None,
        expiration_date: None,
        notes: None,
        supplier_id: None,
    }
}

pub(crate) fn employee_input(user_id: &str, national_id: &str) -> EmployeeInput {
    EmployeeInput {
        user_id: user_id.to_string(),
        national_id: national_id.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1995, 3, 14).unwrap(),
        hire_date: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
        employment_status: EmploymentStatus::FullTime,
        emergency_contact: EmergencyContact::default(),
        education: Education::default(),
        salary_cents: 15_000_000,
    }
}

/// An owner with a business, one shop and one warehouse.
pub(crate) struct Fixture {
    pub owner: User,
    pub business: BusinessInformation,
    pub shop: Shop,
    pub warehouse: Warehouse,
}

pub(crate) async fn setup_shop(db: &Database) -> Fixture {
    let owner = db
        .users()
        .create(&register_request("amina", "amina@shop.cm"), "hash")
        .await
        .unwrap();
    let business = db
        .businesses()
        .create(&owner.id, &business_input("Amina Stores"))
        .await
        .unwrap();
    let shop = db
        .shops()
        .create(&owner.id, &business.id, &shop_input("Akwa Branch"))
        .await
        .unwrap();
    let warehouse = db
        .warehouses()
        .create(&shop.id, &warehouse_input("Douala Central"))
        .await
        .unwrap();

    Fixture {
        owner,
        business,
        shop,
        warehouse,
    }
}

/// Creates a product priced 100.00 with `quantity` units in the fixture
/// warehouse.
pub(crate) async fn stock_product(
    db: &Database,
    fx: &Fixture,
    sku: &str,
    quantity: i64,
) -> (Product, Inventory) {
    let product = db
        .products()
        .create(&fx.shop.id, &product_input(sku, 10_000), sku, None)
        .await
        .unwrap();
    let inventory = db
        .inventory()
        .create(
            &fx.shop.id,
            &inventory_input(&product.id, &fx.warehouse.id, quantity),
            &fx.owner.id,
        )
        .await
        .unwrap();
    let product = db
        .products()
        .get(&fx.shop.id, &product.id)
        .await
        .unwrap()
        .unwrap();
    (product, inventory)
}
