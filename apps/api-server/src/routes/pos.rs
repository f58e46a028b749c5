//! Point of sale: the caller's cart in the current shop, and checkout.
//!
//! ```text
//! add / update / remove ──► CartStore (per user, per shop)
//!                                │
//! POST pos/checkout/ ──► take cart ──► sales().checkout ──► restore cart on failure
//!                                         │
//!                                         └─ one transaction: sale, items,
//!                                            stock out, invoice, payment,
//!                                            ledger, escrow
//! ```

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nanotrade_core::{
    AddCartItemRequest, CartResponse, CheckoutRequest, CoreError, Permission, Product,
    PromoRequest, SaleReceipt, UpdateCartItemRequest,
};
use nanotrade_core::validation::validate_uuid;
use nanotrade_db::CheckoutRequestData;
use tracing::info;

use crate::auth::ShopScope;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

/// `GET pos/cart/`
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<CartResponse>> {
    scope.require(Permission::UsePos)?;
    let cart = state.carts.snapshot(scope.user_id(), scope.shop_id())?;
    Ok(Json(CartResponse::from(&cart)))
}

/// `DELETE pos/cart/`
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<CartResponse>> {
    scope.require(Permission::UsePos)?;
    let cart = state.carts.update(scope.user_id(), scope.shop_id(), |cart| {
        cart.clear();
        Ok(())
    })?;
    Ok(Json(CartResponse::from(&cart)))
}

/// `POST pos/cart/items/`
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(request): ApiJson<AddCartItemRequest>,
) -> ApiResult<Json<CartResponse>> {
    scope.require(Permission::UsePos)?;
    request.validate()?;

    let product = load_product(&state, scope.shop_id(), &request.product_id).await?;
    if let Some(warehouse_id) = &request.warehouse_id {
        ensure_warehouse(&state, scope.shop_id(), warehouse_id).await?;
    }

    let cart = state.carts.update(scope.user_id(), scope.shop_id(), |cart| {
        cart.add_item(&product, request.quantity, request.warehouse_id.clone())
    })?;
    Ok(Json(CartResponse::from(&cart)))
}

/// `PUT pos/cart/items/{product_id}/`. A quantity of zero removes the line.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(product_id): Path<String>,
    ApiJson(request): ApiJson<UpdateCartItemRequest>,
) -> ApiResult<Json<CartResponse>> {
    scope.require(Permission::UsePos)?;

    if let Some(quantity) = request.quantity.filter(|q| *q > 0) {
        let product = load_product(&state, scope.shop_id(), &product_id).await?;
        if quantity > product.quantity {
            return Err(CoreError::InsufficientStock {
                sku: product.sku,
                available: product.quantity,
                requested: quantity,
            }
            .into());
        }
    }
    if let Some(warehouse_id) = &request.warehouse_id {
        validate_uuid("warehouse_id", warehouse_id)?;
        ensure_warehouse(&state, scope.shop_id(), warehouse_id).await?;
    }

    let cart = state.carts.update(scope.user_id(), scope.shop_id(), |cart| {
        if let Some(warehouse_id) = &request.warehouse_id {
            cart.set_warehouse(&product_id, Some(warehouse_id.clone()))?;
        }
        match request.quantity {
            Some(quantity) => cart.update_quantity(&product_id, quantity),
            None => Ok(()),
        }
    })?;
    Ok(Json(CartResponse::from(&cart)))
}

/// `DELETE pos/cart/items/{product_id}/`
pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(product_id): Path<String>,
) -> ApiResult<Json<CartResponse>> {
    scope.require(Permission::UsePos)?;
    let cart = state
        .carts
        .update(scope.user_id(), scope.shop_id(), |cart| cart.remove_item(&product_id))?;
    Ok(Json(CartResponse::from(&cart)))
}

/// `POST pos/cart/promo/`
pub async fn apply_promo(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(request): ApiJson<PromoRequest>,
) -> ApiResult<Json<CartResponse>> {
    scope.require(Permission::UsePos)?;

    let code = request.code.trim().to_ascii_uppercase();
    let discount_bps = state
        .config
        .promo_discount(&code)
        .ok_or_else(|| ApiError::validation(format!("Unknown promo code '{}'", code)))?;

    let cart = state.carts.update(scope.user_id(), scope.shop_id(), |cart| {
        cart.apply_promo(&code, discount_bps)
    })?;
    Ok(Json(CartResponse::from(&cart)))
}

/// `DELETE pos/cart/promo/`
pub async fn clear_promo(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<CartResponse>> {
    scope.require(Permission::UsePos)?;
    let cart = state.carts.update(scope.user_id(), scope.shop_id(), |cart| {
        cart.clear_promo();
        Ok(())
    })?;
    Ok(Json(CartResponse::from(&cart)))
}

/// `POST pos/checkout/`
///
/// Sells the cart. The cart leaves the store while the sale runs, so two
/// checkouts cannot sell it twice; a failed checkout puts it back to be
/// retried as is.
pub async fn checkout(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<SaleReceipt>)> {
    scope.require(Permission::UsePos)?;
    request.validate()?;

    let cart = state.carts.take(scope.user_id(), scope.shop_id())?;
    if cart.is_empty() {
        state.carts.restore(scope.user_id(), scope.shop_id(), cart)?;
        return Err(CoreError::EmptyCart.into());
    }

    let data = CheckoutRequestData::from_cart(scope.shop_id(), scope.user_id(), &cart, &request);
    let receipt = match state.db.sales().checkout(&data).await {
        Ok(receipt) => receipt,
        Err(err) => {
            state.carts.restore(scope.user_id(), scope.shop_id(), cart)?;
            return Err(err.into());
        }
    };

    info!(
        sale_id = %receipt.sale.id,
        receipt = %receipt.sale.receipt_number,
        total = %receipt.sale.total(),
        escrow = receipt.escrow.is_some(),
        "Checkout completed"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn load_product(state: &AppState, shop_id: &str, product_id: &str) -> ApiResult<Product> {
    state
        .db
        .products()
        .get(shop_id, product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}

async fn ensure_warehouse(state: &AppState, shop_id: &str, warehouse_id: &str) -> ApiResult<()> {
    match state.db.warehouses().get(shop_id, warehouse_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Warehouse", warehouse_id)),
    }
}
