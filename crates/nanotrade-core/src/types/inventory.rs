//! Warehouses, per-warehouse inventory and the stock movement log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::account::RecordStatus;
use crate::listing::Searchable;
use crate::stock::{MovementType, StockLevel, StockStatus};

// =============================================================================
// Warehouse
// =============================================================================

/// A storage location belonging to a shop.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Warehouse {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub region: String,
    /// Free text location ("Akwa, Douala").
    pub location: Option<String>,
    /// Capacity in units.
    pub capacity: Option<i64>,
    /// Person in charge.
    pub manager: Option<String>,
    pub description: Option<String>,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Searchable for Warehouse {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.region.as_str()];
        fields.extend(self.location.as_deref());
        fields.extend(self.manager.as_deref());
        fields
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Stock of one product in one warehouse.
///
/// `(product_id, warehouse_id)` is unique and `quantity` never drops below
/// zero.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Inventory {
    pub id: String,
    pub product_id: String,
    pub warehouse_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
    pub minimum_stock_level: i64,
    pub maximum_stock_level: Option<i64>,
    pub batch_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// The row's quantity and bounds as a [`StockLevel`].
    pub fn level(&self) -> StockLevel {
        StockLevel {
            quantity: self.quantity,
            minimum: self.minimum_stock_level,
            maximum: self.maximum_stock_level,
        }
    }

    /// Whether the batch has expired on `today`.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|d| d < today)
    }
}

/// Inventory row joined with product and warehouse names, as listed on the
/// inventory screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryLine {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub quantity: i64,
    pub minimum_stock_level: i64,
    pub maximum_stock_level: Option<i64>,
    pub reorder_level: i64,
    pub batch_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub expiration_date: Option<NaiveDate>,
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
}

impl InventoryLine {
    /// Status of this warehouse's stock against the larger of the row
    /// minimum and the product reorder level.
    pub fn status(&self) -> StockStatus {
        StockStatus::derive(
            self.quantity,
            self.minimum_stock_level.max(self.reorder_level),
        )
    }
}

impl Searchable for InventoryLine {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.product_name.as_str(),
            self.sku.as_str(),
            self.warehouse_name.as_str(),
        ]
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One entry of the append-only stock log.
///
/// `quantity` is the signed delta that was applied and `quantity_after` the
/// inventory quantity right after it, so the log can be audited without
/// replaying it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub inventory_id: String,
    pub warehouse_id: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub quantity_after: i64,
    pub supplier_id: Option<String>,
    pub reason: Option<String>,
    pub performed_by_id: String,
    /// Sale that caused a `sold`/`returned` movement.
    pub sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Reorder Suggestion
// =============================================================================

/// A warehouse row that should be restocked, with the suggested quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReorderSuggestion {
    pub inventory_id: String,
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub quantity: i64,
    pub suggested_quantity: i64,
}
