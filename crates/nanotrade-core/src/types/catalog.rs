//! Catalog: categories, suppliers and products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::listing::Searchable;
use crate::money::Money;
use crate::stock::StockStatus;

// =============================================================================
// Category
// =============================================================================

/// A product category, unique by name within a shop.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Media path of the uploaded image (`media/<file>`).
    pub image: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Searchable for Category {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        if let Some(description) = &self.description {
            fields.push(description);
        }
        fields
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// Someone stock is bought from.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    /// Contact person.
    pub contact_info: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Searchable for Supplier {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str()];
        fields.extend(self.contact_info.as_deref());
        fields.extend(self.phone.as_deref());
        fields
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product sold by a shop.
///
/// ## Derived Fields
/// `quantity` and `status` are never written by callers. The inventory
/// repository recomputes them after every stock change:
/// ```text
/// quantity = Σ inventory.quantity (all warehouses)
/// status   = StockStatus::derive(quantity, reorder_level)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    /// Stock Keeping Unit, unique within the shop.
    pub sku: String,
    /// Selling price in minor units.
    pub price_cents: i64,
    /// Purchase (cost) price in minor units.
    pub purchase_price_cents: i64,
    /// Total stock across warehouses (derived).
    pub quantity: i64,
    pub description: Option<String>,
    pub category_id: Option<String>,
    /// Stock status (derived).
    pub status: StockStatus,
    pub reorder_level: i64,
    /// Unit the product is sold in ("piece", "kg", "bag").
    pub unit_type: String,
    pub image: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Gross margin per unit.
    pub fn unit_margin(&self) -> Money {
        self.price() - self.purchase_price()
    }

    /// Whether `quantity` units can be sold from the product's total stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.status != StockStatus::OutOfStock && self.quantity >= quantity
    }
}

impl Searchable for Product {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.sku.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

/// Builds a SKU for a product created without one.
///
/// Takes up to three words of the name, keeps their first four
/// alphanumeric characters, upper-cases them and appends `suffix`.
///
/// ## Example
/// ```rust
/// use nanotrade_core::types::generate_sku;
///
/// assert_eq!(generate_sku("Palm oil (5 litres)", "7F3A"), "PALM-OIL-5-7F3A");
/// ```
pub fn generate_sku(name: &str, suffix: &str) -> String {
    let mut parts: Vec<String> = name
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(4)
                .collect::<String>()
                .to_ascii_uppercase()
        })
        .filter(|word| !word.is_empty())
        .take(3)
        .collect();
    if parts.is_empty() {
        parts.push("ITEM".to_string());
    }
    parts.push(suffix.to_ascii_uppercase());
    parts.join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            shop_id: "s1".to_string(),
            name: "Rice 25kg".to_string(),
            sku: "RICE-25KG".to_string(),
            price_cents: 1_500_000,
            purchase_price_cents: 1_200_000,
            quantity,
            description: None,
            category_id: None,
            status: StockStatus::derive(quantity, 10),
            reorder_level: 10,
            unit_type: "bag".to_string(),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_sell_respects_total_stock() {
        assert!(product(5).can_sell(5));
        assert!(!product(5).can_sell(6));
        assert!(!product(0).can_sell(1));
    }

    #[test]
    fn test_unit_margin() {
        assert_eq!(product(1).unit_margin().cents(), 300_000);
    }

    #[test]
    fn test_generate_sku() {
        assert_eq!(generate_sku("Rice 25kg", "a1b2"), "RICE-25KG-A1B2");
        assert_eq!(generate_sku("  ", "0001"), "ITEM-0001");
        assert!(crate::validation::validate_sku(&generate_sku("Café crème", "x")).is_ok());
    }

    #[test]
    fn test_product_is_searchable_by_sku() {
        let p = product(1);
        assert!(p.search_fields().contains(&"RICE-25KG"));
    }
}
