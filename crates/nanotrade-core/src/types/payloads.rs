//! Request and response bodies of the `/api/v1` REST API.
//!
//! The server decodes these and the client encodes them, so both sides
//! agree on field names. Each input type validates itself before it
//! reaches a repository.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::account::{
    Address, BusinessContact, BusinessInformation, Education, EmergencyContact,
    EmploymentStatus, Location, OperatingHours, RecordStatus, ShopContact, ShopLocation, User,
};
use super::inventory::InventoryLine;
use super::sales::{DeliveryStatus, Escrow, PaymentMethod, PaymentStatus};
use crate::cart::{Cart, CartTotals};
use crate::error::ValidationError;
use crate::escrow::EscrowSummary;
use crate::money::Money;
use crate::roles::UserRole;
use crate::stock::{MovementType, StockStatus};
use crate::validation::{
    validate_email, validate_name, validate_password, validate_payment_amount, validate_phone,
    validate_price_cents, validate_quantity, validate_reorder_level, validate_sku,
    validate_stock_bounds, validate_username, validate_uuid, validate_year_established,
    ValidationResult,
};

// =============================================================================
// Auth
// =============================================================================

/// `POST auth/register/`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub location: Location,
}

impl RegisterRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        if let Some(phone) = &self.phone_number {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

/// `POST auth/login/`. `username` also accepts the account email.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub business: Option<BusinessInformation>,
}

/// `PUT auth/me/`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub password: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(phone) = &self.phone_number {
            validate_phone(phone)?;
        }
        if let Some(password) = &self.password {
            validate_password(password)?;
        }
        Ok(())
    }
}

// =============================================================================
// Business & Shops
// =============================================================================

/// `POST business/` and `PUT business/{id}/update/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessInput {
    pub full_business_name: String,
    pub business_type: String,
    pub address: Address,
    pub number_of_employees: i64,
    pub tax_id_number: String,
    #[serde(default)]
    pub shop_logo: Option<String>,
    #[serde(default)]
    pub taxation_documents: Option<String>,
    #[serde(default)]
    pub national_id_card: Option<String>,
    pub contact_info: BusinessContact,
    pub legal_structure: String,
    pub year_established: i64,
    pub industry_category: String,
    #[serde(default)]
    pub annual_revenue_cents: Option<i64>,
    #[serde(default)]
    pub business_description: String,
}

impl BusinessInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("full_business_name", &self.full_business_name, 200)?;
        validate_name("business_type", &self.business_type, 100)?;
        validate_name("tax_id_number", &self.tax_id_number, 50)?;
        validate_email(&self.contact_info.email)?;
        validate_phone(&self.contact_info.phone)?;
        if self.number_of_employees < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "number_of_employees".to_string(),
            });
        }
        validate_year_established(self.year_established, i64::from(Utc::now().year()))?;
        if let Some(revenue) = self.annual_revenue_cents {
            validate_price_cents("annual_revenue", revenue)?;
        }
        Ok(())
    }
}

/// `POST shops/create/` and `PUT shops/{id}/update/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShopInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub location: ShopLocation,
    #[serde(default)]
    pub contact_info: ShopContact,
    #[serde(default)]
    pub operating_hours: OperatingHours,
}

impl ShopInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 120)?;
        if !self.contact_info.email.is_empty() {
            validate_email(&self.contact_info.email)?;
        }
        Ok(())
    }
}

/// `POST employees/create/`. Links an existing user to the current shop.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeInput {
    pub user_id: String,
    pub national_id: String,
    #[ts(as = "String")]
    pub date_of_birth: NaiveDate,
    #[ts(as = "String")]
    pub hire_date: NaiveDate,
    pub employment_status: EmploymentStatus,
    #[serde(default)]
    pub emergency_contact: EmergencyContact,
    #[serde(default)]
    pub education: Education,
    #[serde(default)]
    pub salary_cents: i64,
}

impl EmployeeInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("user_id", &self.user_id)?;
        validate_name("national_id", &self.national_id, 50)?;
        if self.hire_date <= self.date_of_birth {
            return Err(ValidationError::InvalidFormat {
                field: "hire_date".to_string(),
                reason: "must be after date_of_birth".to_string(),
            });
        }
        validate_price_cents("salary", self.salary_cents)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Text fields of the category form (sent as multipart with an optional
/// `image` file).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 100)
    }
}

/// Text fields of the product form (sent as multipart with an optional
/// `image` file; prices travel as decimal strings).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    /// Generated from the name when absent.
    #[serde(default)]
    pub sku: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub purchase_price_cents: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub reorder_level: Option<i64>,
    #[serde(default)]
    pub unit_type: Option<String>,
    /// Shops to create the product in; the current shop when empty.
    #[serde(default)]
    pub shops: Vec<String>,
}

impl ProductInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 200)?;
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        validate_price_cents("price", self.price_cents)?;
        validate_price_cents("purchase_price", self.purchase_price_cents)?;
        if let Some(level) = self.reorder_level {
            validate_reorder_level(level)?;
        }
        if let Some(category_id) = &self.category_id {
            validate_uuid("category", category_id)?;
        }
        for shop in &self.shops {
            validate_uuid("shops", shop)?;
        }
        Ok(())
    }
}

/// `POST suppliers/create/` and `PUT suppliers/{id}/update/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierInput {
    pub name: String,
    #[serde(default)]
    pub contact_info: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl SupplierInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 150)?;
        validate_email(&self.email)?;
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

// =============================================================================
// Warehouses & Inventory
// =============================================================================

/// `POST warehouses/create/` and `PUT warehouses/{id}/update/`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WarehouseInput {
    pub name: String,
    pub region: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub manager: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: RecordStatus,
}

impl WarehouseInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 120)?;
        validate_name("region", &self.region, 120)?;
        if let Some(capacity) = self.capacity {
            if capacity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "capacity".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// `POST inventory/create/`. A positive opening quantity is booked as an
/// `added` movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryInput {
    pub product_id: String,
    pub warehouse_id: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub minimum_stock_level: i64,
    #[serde(default)]
    pub maximum_stock_level: Option<i64>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
}

impl InventoryInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("product_id", &self.product_id)?;
        validate_uuid("warehouse_id", &self.warehouse_id)?;
        if self.quantity < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "quantity".to_string(),
            });
        }
        validate_stock_bounds(self.minimum_stock_level, self.maximum_stock_level)?;
        if let Some(maximum) = self.maximum_stock_level {
            if self.quantity > maximum {
                return Err(ValidationError::OutOfRange {
                    field: "quantity".to_string(),
                    min: 0,
                    max: maximum,
                });
            }
        }
        Ok(())
    }
}

/// `PUT inventory/{id}/update/`. Quantity is not editable here: stock only
/// changes through movements.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryUpdate {
    #[serde(default)]
    pub minimum_stock_level: i64,
    #[serde(default)]
    pub maximum_stock_level: Option<i64>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl InventoryUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_stock_bounds(self.minimum_stock_level, self.maximum_stock_level)
    }
}

/// `POST inventory/{id}/movements/`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementInput {
    pub movement_type: MovementType,
    pub quantity: i64,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl MovementInput {
    pub fn validate(&self) -> ValidationResult<()> {
        self.movement_type.signed_delta(self.quantity)?;
        if self.movement_type == MovementType::Adjustment
            && self.reason.as_deref().map_or(true, |r| r.trim().is_empty())
        {
            return Err(ValidationError::Required {
                field: "reason".to_string(),
            });
        }
        if let Some(supplier_id) = &self.supplier_id {
            validate_uuid("supplier_id", supplier_id)?;
        }
        Ok(())
    }
}

/// Inventory list with a stock status per row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryRow {
    #[serde(flatten)]
    pub line: InventoryLine,
    pub status: StockStatus,
}

impl From<InventoryLine> for InventoryRow {
    fn from(line: InventoryLine) -> Self {
        let status = line.status();
        InventoryRow { line, status }
    }
}

// =============================================================================
// POS
// =============================================================================

/// `POST pos/cart/items/`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddCartItemRequest {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
    #[serde(default)]
    pub warehouse_id: Option<String>,
}

fn one() -> i64 {
    1
}

impl AddCartItemRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("product_id", &self.product_id)?;
        validate_quantity(self.quantity)?;
        if let Some(warehouse_id) = &self.warehouse_id {
            validate_uuid("warehouse_id", warehouse_id)?;
        }
        Ok(())
    }
}

/// `PUT pos/cart/items/{product_id}/`. Either field may be given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateCartItemRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub warehouse_id: Option<String>,
}

/// `POST pos/cart/promo/`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PromoRequest {
    pub code: String,
}

/// Every cart endpoint answers with the cart and its totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartResponse {
    pub cart: Cart,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            cart: cart.clone(),
            totals: cart.totals(),
        }
    }
}

/// A payment made against an invoice (at checkout or later).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentInput {
    pub amount_cents: i64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl PaymentInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_payment_amount(self.amount_cents)
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// `POST pos/checkout/`
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub payment: Option<PaymentInput>,
    /// Hold the paid amount in escrow until delivery.
    #[serde(default)]
    pub hold_in_escrow: bool,
}

impl CheckoutRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(customer_id) = &self.customer_id {
            validate_uuid("customer_id", customer_id)?;
        }
        if let Some(payment) = &self.payment {
            payment.validate()?;
        }
        Ok(())
    }
}

// =============================================================================
// Escrow
// =============================================================================

/// `GET reports/escrow/`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EscrowReport {
    pub currency: String,
    pub summary: EscrowSummary,
    pub active: Vec<Escrow>,
    pub completed: Vec<Escrow>,
}

/// `POST escrows/withdraw/`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WithdrawResponse {
    pub withdrawn: Vec<Escrow>,
    pub amount_cents: i64,
}

/// `GET reports/balance/`: payments received minus expenses.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceReport {
    pub currency: String,
    pub balance_cents: i64,
}

// =============================================================================
// Customers, Expenses, Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(default)]
    pub location: Location,
}

impl CustomerInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("first_name", &self.first_name, 100)?;
        validate_name("last_name", &self.last_name, 100)?;
        validate_phone(&self.phone_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ExpenseInput {
    pub description: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub expense_date: NaiveDate,
}

impl ExpenseInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("description", &self.description, 500)?;
        validate_payment_amount(self.amount_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderInput {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl OrderInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("product_id", &self.product_id)?;
        validate_quantity(self.quantity)?;
        if let Some(customer_id) = &self.customer_id {
            validate_uuid("customer_id", customer_id)?;
        }
        Ok(())
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub version: String,
}

/// `PUT orders/{id}/status/`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderStatusUpdate {
    #[serde(default)]
    pub delivery_status: Option<DeliveryStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

// =============================================================================
// Listing
// =============================================================================

/// Query string of list endpoints: `?search=&page=&per_page=&shop=`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_defaults_to_shop_owner() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"amina","email":"amina@shop.cm","password":"longenough"}"#,
        )
        .unwrap();
        assert_eq!(req.role, UserRole::ShopOwner);
        assert_eq!(req.location.country.code, "CM");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_adjustment_requires_reason() {
        let mut input = MovementInput {
            movement_type: MovementType::Adjustment,
            quantity: -2,
            supplier_id: None,
            reason: None,
        };
        assert!(input.validate().is_err());
        input.reason = Some("broken bottles".to_string());
        assert!(input.validate().is_ok());

        let zero = MovementInput {
            movement_type: MovementType::Added,
            quantity: 0,
            supplier_id: None,
            reason: None,
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_inventory_opening_quantity_respects_maximum() {
        let input = InventoryInput {
            product_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            warehouse_id: "550e8400-e29b-41d4-a716-446655440001".to_string(),
            quantity: 60,
            minimum_stock_level: 5,
            maximum_stock_level: Some(50),
            batch_number: None,
            expiration_date: None,
            notes: None,
            supplier_id: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_add_cart_item_quantity_defaults_to_one() {
        let req: AddCartItemRequest =
            serde_json::from_str(r#"{"product_id":"550e8400-e29b-41d4-a716-446655440000"}"#)
                .unwrap();
        assert_eq!(req.quantity, 1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_list_params_skip_empty_fields() {
        let params = ListParams {
            search: Some("oil".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"search":"oil"}"#);
    }
}
