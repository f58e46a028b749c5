//! # Stock Consistency Model
//!
//! Rules tying products, per-warehouse inventory and the movement log
//! together.
//!
//! ## Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   StockMovement (append-only)                                           │
//! │   added +n │ sold -n │ returned +n │ adjustment ±n                      │
//! │        │                                                                │
//! │        ▼  signed_delta()                                                │
//! │   Inventory (product × warehouse)                                       │
//! │   quantity' = quantity + delta      0 ≤ quantity' (≤ maximum)           │
//! │        │                                                                │
//! │        ▼  Σ over warehouses                                             │
//! │   Product.quantity ──► StockStatus::derive(quantity, reorder_level)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer runs the same checks as conditional SQL updates
//! inside one transaction; this module is the reference for what those
//! updates must enforce.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::MAX_MOVEMENT_QUANTITY;

// =============================================================================
// Stock Status
// =============================================================================

/// Availability of a product, derived from its quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Default)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    #[default]
    OutOfStock,
}

impl StockStatus {
    /// Derives the status from a quantity and a low-stock threshold.
    ///
    /// ```text
    /// quantity <= 0          → OutOfStock
    /// quantity <= threshold  → LowStock
    /// otherwise              → InStock
    /// ```
    pub fn derive(quantity: i64, threshold: i64) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= threshold {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "in_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}

/// Status of a product from the quantities held in each warehouse.
pub fn aggregate_status<I>(quantities: I, reorder_level: i64) -> StockStatus
where
    I: IntoIterator<Item = i64>,
{
    StockStatus::derive(quantities.into_iter().sum(), reorder_level)
}

// =============================================================================
// Movement Type
// =============================================================================

/// Why stock changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Received from a supplier.
    Added,
    /// Sold through the POS.
    Sold,
    /// Returned by a customer (or a cancelled sale).
    Returned,
    /// Manual correction after a count; the sign is taken as given.
    Adjustment,
}

impl MovementType {
    /// Turns a movement quantity into the signed change it applies.
    ///
    /// `Added` and `Returned` always add, `Sold` always removes, and
    /// `Adjustment` keeps the caller's sign. A zero quantity, or one larger
    /// than [`MAX_MOVEMENT_QUANTITY`] either way, is rejected for every type.
    ///
    /// ## Example
    /// ```rust
    /// use nanotrade_core::stock::MovementType;
    ///
    /// assert_eq!(MovementType::Sold.signed_delta(3).unwrap(), -3);
    /// assert_eq!(MovementType::Added.signed_delta(-3).unwrap(), 3);
    /// assert_eq!(MovementType::Adjustment.signed_delta(-2).unwrap(), -2);
    /// ```
    pub fn signed_delta(&self, quantity: i64) -> Result<i64, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            });
        }
        if quantity.unsigned_abs() > MAX_MOVEMENT_QUANTITY.unsigned_abs() {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: -MAX_MOVEMENT_QUANTITY,
                max: MAX_MOVEMENT_QUANTITY,
            });
        }
        Ok(match self {
            MovementType::Added | MovementType::Returned => quantity.abs(),
            MovementType::Sold => -quantity.abs(),
            MovementType::Adjustment => quantity,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Added => "added",
            MovementType::Sold => "sold",
            MovementType::Returned => "returned",
            MovementType::Adjustment => "adjustment",
        }
    }
}

// =============================================================================
// Stock Level
// =============================================================================

/// Quantity of one inventory row together with its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockLevel {
    pub quantity: i64,
    pub minimum: i64,
    pub maximum: Option<i64>,
}

/// Result of applying a movement to a [`StockLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub before: i64,
    pub delta: i64,
    pub after: i64,
}

impl StockLevel {
    /// Applies a movement and returns the resulting change.
    ///
    /// ## Errors
    /// - [`CoreError::InsufficientStock`] if the quantity would go negative
    /// - [`CoreError::AboveMaximumStock`] if an increase would pass
    ///   `maximum` (decreases are always allowed)
    /// - [`CoreError::Validation`] for a zero quantity
    pub fn apply(
        &self,
        sku: &str,
        movement_type: MovementType,
        quantity: i64,
    ) -> CoreResult<StockChange> {
        let delta = movement_type.signed_delta(quantity)?;
        let after = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        if after < 0 {
            return Err(CoreError::InsufficientStock {
                sku: sku.to_string(),
                available: self.quantity,
                requested: -delta,
            });
        }

        if let Some(maximum) = self.maximum {
            if delta > 0 && after > maximum {
                return Err(CoreError::AboveMaximumStock {
                    sku: sku.to_string(),
                    resulting: after,
                    maximum,
                });
            }
        }

        Ok(StockChange {
            before: self.quantity,
            delta,
            after,
        })
    }

    /// Whether the row sits at or below its reorder threshold.
    pub fn needs_reorder(&self, reorder_level: i64) -> bool {
        reorder_suggestion(self.quantity, self.minimum, self.maximum, reorder_level).is_some()
    }
}

// =============================================================================
// Reorder Logic
// =============================================================================

/// How many units to order for an inventory row, if any.
///
/// The threshold is the larger of the row's minimum and the product's
/// reorder level. At or below it, the suggestion fills up to `maximum`, or
/// to twice the threshold when no maximum is set.
///
/// ## Example
/// ```rust
/// use nanotrade_core::stock::reorder_suggestion;
///
/// // 4 left, reorder at 10, no maximum: order up to 20
/// assert_eq!(reorder_suggestion(4, 0, None, 10), Some(16));
/// // 4 left, maximum 50: order up to 50
/// assert_eq!(reorder_suggestion(4, 5, Some(50), 10), Some(46));
/// // comfortably stocked
/// assert_eq!(reorder_suggestion(30, 5, None, 10), None);
/// ```
pub fn reorder_suggestion(
    quantity: i64,
    minimum: i64,
    maximum: Option<i64>,
    reorder_level: i64,
) -> Option<i64> {
    let threshold = minimum.max(reorder_level);
    if quantity > threshold {
        return None;
    }

    let target = maximum.unwrap_or_else(|| (threshold * 2).max(1));
    let suggested = target - quantity;
    (suggested > 0).then_some(suggested)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_status_boundaries() {
        assert_eq!(StockStatus::derive(-1, 10), StockStatus::OutOfStock);
        assert_eq!(StockStatus::derive(0, 10), StockStatus::OutOfStock);
        assert_eq!(StockStatus::derive(1, 10), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(10, 10), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(11, 10), StockStatus::InStock);
        assert_eq!(StockStatus::derive(1, 0), StockStatus::InStock);
    }

    #[test]
    fn test_aggregate_status_sums_warehouses() {
        assert_eq!(aggregate_status([4, 5], 10), StockStatus::LowStock);
        assert_eq!(aggregate_status([6, 5], 10), StockStatus::InStock);
        assert_eq!(aggregate_status(Vec::new(), 10), StockStatus::OutOfStock);
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(MovementType::Added.signed_delta(5).unwrap(), 5);
        assert_eq!(MovementType::Returned.signed_delta(-2).unwrap(), 2);
        assert_eq!(MovementType::Sold.signed_delta(4).unwrap(), -4);
        assert_eq!(MovementType::Sold.signed_delta(-4).unwrap(), -4);
        assert_eq!(MovementType::Adjustment.signed_delta(-7).unwrap(), -7);
        assert!(MovementType::Adjustment.signed_delta(0).is_err());
    }

    #[test]
    fn test_signed_delta_rejects_extreme_quantities() {
        assert!(matches!(
            MovementType::Added.signed_delta(i64::MIN),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(MovementType::Sold.signed_delta(i64::MAX).is_err());
        assert!(MovementType::Adjustment.signed_delta(-MAX_MOVEMENT_QUANTITY - 1).is_err());
        assert_eq!(
            MovementType::Adjustment.signed_delta(-MAX_MOVEMENT_QUANTITY).unwrap(),
            -MAX_MOVEMENT_QUANTITY
        );
    }

    #[test]
    fn test_apply_refuses_negative_stock() {
        let level = StockLevel {
            quantity: 3,
            minimum: 0,
            maximum: None,
        };

        let err = level.apply("OIL-5L", MovementType::Sold, 5).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other}"),
        }

        let change = level.apply("OIL-5L", MovementType::Sold, 3).unwrap();
        assert_eq!(change.after, 0);
        assert_eq!(change.delta, -3);
    }

    #[test]
    fn test_apply_respects_maximum_only_when_increasing() {
        let level = StockLevel {
            quantity: 45,
            minimum: 0,
            maximum: Some(50),
        };
        assert!(matches!(
            level.apply("OIL-5L", MovementType::Added, 10),
            Err(CoreError::AboveMaximumStock { resulting: 55, .. })
        ));
        assert_eq!(
            level.apply("OIL-5L", MovementType::Added, 5).unwrap().after,
            50
        );

        let over = StockLevel {
            quantity: 60,
            minimum: 0,
            maximum: Some(50),
        };
        assert_eq!(over.apply("OIL-5L", MovementType::Sold, 1).unwrap().after, 59);
    }

    #[test]
    fn test_reorder_suggestion() {
        assert_eq!(reorder_suggestion(10, 0, None, 10), Some(10));
        assert_eq!(reorder_suggestion(11, 0, None, 10), None);
        assert_eq!(reorder_suggestion(0, 0, Some(40), 10), Some(40));
        assert_eq!(reorder_suggestion(12, 15, None, 10), Some(18));
        // maximum already reached
        assert_eq!(reorder_suggestion(5, 0, Some(5), 10), None);
        // zero thresholds still restock an empty row
        assert_eq!(reorder_suggestion(0, 0, None, 0), Some(1));
    }

    #[test]
    fn test_needs_reorder() {
        let level = StockLevel {
            quantity: 8,
            minimum: 2,
            maximum: None,
        };
        assert!(level.needs_reorder(10));
        assert!(!level.needs_reorder(5));
    }
}
