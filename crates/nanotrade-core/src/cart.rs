//! # POS Cart
//!
//! The point-of-sale cart a seller fills before checkout.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POS Action               Endpoint                    Cart Change       │
//! │  ──────────               ────────                    ───────────       │
//! │  Click product ─────────► POST pos/cart/items/ ─────► add_item()        │
//! │  Change quantity ───────► PUT  .../{product_id}/ ───► update_quantity() │
//! │  Pick warehouse ────────► PUT  .../{product_id}/ ───► set_warehouse()   │
//! │  Remove line ───────────► DELETE .../{product_id}/ ─► remove_item()     │
//! │  Enter promo code ──────► POST pos/cart/promo/ ─────► apply_promo()     │
//! │  Clear ─────────────────► DELETE pos/cart/ ─────────► clear()           │
//! │  Checkout ──────────────► POST pos/checkout/ ───────► (db transaction)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product merges)
//! - Quantity per line is 1..=[`MAX_ITEM_QUANTITY`]
//! - At most [`MAX_CART_ITEMS`] lines
//! - Out-of-stock products are never added

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::stock::StockStatus;
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// Name, SKU and price are captured when the product is added, so the till
/// keeps showing the price the customer was quoted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Warehouse the goods are taken from; when unset, checkout spreads the
    /// line over the fullest rows.
    pub warehouse_id: Option<String>,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    pub fn from_product(product: &Product, quantity: i64, warehouse_id: Option<String>) -> Self {
        CartItem {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            warehouse_id,
            added_at: Utc::now(),
        }
    }

    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Display total for the line; saturates instead of overflowing.
    ///
    /// Checkout re-prices every line with checked arithmetic.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents.saturating_mul(self.quantity))
    }
}

// =============================================================================
// Promo
// =============================================================================

/// A percentage promotion applied to the whole cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Promo {
    pub code: String,
    /// Discount in basis points (1000 = 10%).
    pub discount_bps: u32,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub promo: Option<Promo>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

fn check_quantity(quantity: i64) -> CoreResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            promo: None,
            created_at: Utc::now(),
        }
    }

    fn find_mut(&mut self, product_id: &str) -> CoreResult<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))
    }

    /// Adds a product, or increases the quantity of its existing line.
    ///
    /// The merged quantity must still be available in the product's total
    /// stock. A `warehouse_id` given here replaces the line's warehouse.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: i64,
        warehouse_id: Option<String>,
    ) -> CoreResult<()> {
        check_quantity(quantity)?;

        if product.status == StockStatus::OutOfStock || product.quantity <= 0 {
            return Err(CoreError::OutOfStock {
                sku: product.sku.clone(),
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let merged = item.quantity + quantity;
            check_quantity(merged)?;
            if merged > product.quantity {
                return Err(CoreError::InsufficientStock {
                    sku: product.sku.clone(),
                    available: product.quantity,
                    requested: merged,
                });
            }
            item.quantity = merged;
            if warehouse_id.is_some() {
                item.warehouse_id = warehouse_id;
            }
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        if quantity > product.quantity {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.quantity,
                requested: quantity,
            });
        }

        self.items
            .push(CartItem::from_product(product, quantity, warehouse_id));
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        check_quantity(quantity)?;
        self.find_mut(product_id)?.quantity = quantity;
        Ok(())
    }

    /// Chooses the warehouse a line is fulfilled from.
    pub fn set_warehouse(&mut self, product_id: &str, warehouse_id: Option<String>) -> CoreResult<()> {
        self.find_mut(product_id)?.warehouse_id = warehouse_id;
        Ok(())
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Applies a percentage promotion, replacing any previous one.
    pub fn apply_promo(&mut self, code: &str, discount_bps: u32) -> CoreResult<()> {
        if discount_bps > 10_000 {
            return Err(ValidationError::OutOfRange {
                field: "discount_bps".to_string(),
                min: 0,
                max: 10_000,
            }
            .into());
        }
        self.promo = Some(Promo {
            code: code.to_string(),
            discount_bps,
        });
        Ok(())
    }

    pub fn clear_promo(&mut self) {
        self.promo = None;
    }

    /// Empties the cart and drops the promotion.
    pub fn clear(&mut self) {
        self.items.clear();
        self.promo = None;
        self.created_at = Utc::now();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Money::zero(), |acc, line| {
                Money::from_cents(acc.cents().saturating_add(line.cents()))
            })
    }

    pub fn discount(&self) -> Money {
        match &self.promo {
            Some(promo) => self.subtotal().percentage_of(promo.discount_bps),
            None => Money::zero(),
        }
    }

    pub fn total(&self) -> Money {
        self.subtotal() - self.discount()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Cart summary returned with every cart response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal().cents(),
            discount_cents: cart.discount().cents(),
            total_cents: cart.total().cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            shop_id: "shop-1".to_string(),
            name: format!("Product {}", id),
            sku: format!("SKU-{}", id),
            price_cents,
            purchase_price_cents: price_cents / 2,
            quantity,
            description: None,
            category_id: None,
            status: StockStatus::derive(quantity, 10),
            reorder_level: 10,
            unit_type: "piece".to_string(),
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 999, 50), 2, None).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal().cents(), 1998);
    }

    #[test]
    fn test_add_same_product_merges() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 50);

        cart.add_item(&product, 2, None).unwrap();
        cart.add_item(&product, 3, Some("wh-2".to_string())).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.items[0].warehouse_id.as_deref(), Some("wh-2"));
    }

    #[test]
    fn test_out_of_stock_product_is_refused() {
        let mut cart = Cart::new();
        let err = cart
            .add_item(&test_product("1", 999, 0), 1, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_merge_cannot_exceed_stock() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 4);

        cart.add_item(&product, 3, None).unwrap();
        let err = cart.add_item(&product, 2, None).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 4,
                requested: 5,
                ..
            }
        ));
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new();
        let product = test_product("1", 100, 5000);

        assert!(matches!(
            cart.add_item(&product, 0, None),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            cart.add_item(&product, MAX_ITEM_QUANTITY + 1, None),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_max_lines() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&test_product(&i.to_string(), 100, 20), 1, None)
                .unwrap();
        }
        let err = cart
            .add_item(&test_product("extra", 100, 20), 1, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::CartTooLarge { .. }));
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 999, 50), 2, None).unwrap();

        cart.update_quantity("1", 7).unwrap();
        assert_eq!(cart.total_quantity(), 7);

        cart.update_quantity("1", 0).unwrap();
        assert!(cart.is_empty());

        assert!(matches!(
            cart.update_quantity("1", 3),
            Err(CoreError::NotInCart(_))
        ));
    }

    #[test]
    fn test_set_warehouse_and_remove() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 999, 50), 1, None).unwrap();

        cart.set_warehouse("1", Some("wh-1".to_string())).unwrap();
        assert_eq!(cart.items[0].warehouse_id.as_deref(), Some("wh-1"));

        cart.remove_item("1").unwrap();
        assert!(cart.remove_item("1").is_err());
    }

    #[test]
    fn test_promo_discount() {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", 10_000, 50), 1, None).unwrap();
        cart.apply_promo("WELCOME10", 1000).unwrap();

        let totals = cart.totals();
        assert_eq!(totals.subtotal_cents, 10_000);
        assert_eq!(totals.discount_cents, 1_000);
        assert_eq!(totals.total_cents, 9_000);

        assert!(cart.apply_promo("TOO-MUCH", 10_001).is_err());

        cart.clear();
        assert!(cart.promo.is_none());
        assert_eq!(cart.total().cents(), 0);
    }
}
