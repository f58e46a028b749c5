//! # Cart Store
//!
//! Open POS carts, one per (user, shop).
//!
//! ## Thread Safety
//! Carts live behind one `std::sync::Mutex`. The lock is held only for the
//! synchronous cart edit, never across an `.await`, so product lookups and
//! database calls happen before or after it.
//!
//! ```text
//! POST pos/cart/items/ ──► load product (await) ──► lock ──► cart.add_item ──► unlock
//! POST pos/checkout/   ──► lock ──► take ──► unlock ──► checkout (await)
//!                                                          │ failed
//!                                                          └──► lock ──► restore
//! ```
//!
//! Checkout takes the cart out of the store before selling it, so a second
//! checkout of the same cart finds it empty instead of selling it twice.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use nanotrade_core::{Cart, CoreResult, MAX_CART_ITEMS};

use crate::error::{ApiError, ApiResult};

type CartKey = (String, String);

#[derive(Debug, Default)]
pub struct CartStore {
    carts: Mutex<HashMap<CartKey, Cart>>,
}

impl CartStore {
    pub fn new() -> Self {
        CartStore::default()
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, HashMap<CartKey, Cart>>> {
        self.carts
            .lock()
            .map_err(|_| ApiError::internal("Cart store mutex poisoned"))
    }

    /// A copy of the user's cart in a shop (empty if none is open).
    pub fn snapshot(&self, user_id: &str, shop_id: &str) -> ApiResult<Cart> {
        let carts = self.lock()?;
        Ok(carts
            .get(&key(user_id, shop_id))
            .cloned()
            .unwrap_or_default())
    }

    /// Applies `edit` to the cart and returns the cart afterwards.
    ///
    /// A failed edit leaves the cart as it was.
    pub fn update<F>(&self, user_id: &str, shop_id: &str, edit: F) -> ApiResult<Cart>
    where
        F: FnOnce(&mut Cart) -> CoreResult<()>,
    {
        let mut carts = self.lock()?;
        let cart = carts.entry(key(user_id, shop_id)).or_default();
        let mut draft = cart.clone();
        edit(&mut draft)?;
        *cart = draft;
        Ok(cart.clone())
    }

    /// Removes the cart from the store and hands it over (empty if none
    /// is open).
    pub fn take(&self, user_id: &str, shop_id: &str) -> ApiResult<Cart> {
        Ok(self
            .lock()?
            .remove(&key(user_id, shop_id))
            .unwrap_or_default())
    }

    /// Puts back a cart whose checkout failed.
    ///
    /// Lines added since [`take`](Self::take) are kept; the taken lines are
    /// added after them unless the product is already in the cart.
    pub fn restore(&self, user_id: &str, shop_id: &str, taken: Cart) -> ApiResult<()> {
        let mut carts = self.lock()?;
        let cart = carts.entry(key(user_id, shop_id)).or_default();
        if cart.is_empty() && cart.promo.is_none() {
            *cart = taken;
            return Ok(());
        }

        for item in taken.items {
            if cart.items.len() >= MAX_CART_ITEMS {
                break;
            }
            if !cart.items.iter().any(|i| i.product_id == item.product_id) {
                cart.items.push(item);
            }
        }
        if cart.promo.is_none() {
            cart.promo = taken.promo;
        }
        Ok(())
    }

}

fn key(user_id: &str, shop_id: &str) -> CartKey {
    (user_id.to_string(), shop_id.to_string())
}
