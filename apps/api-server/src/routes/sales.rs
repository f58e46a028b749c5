//! Completed sales: receipts, cancellation and later payments.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nanotrade_core::{Invoice, PaymentInput, Permission, Sale, SaleReceipt};
use tracing::info;

use crate::auth::ShopScope;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

/// `GET sales/`, newest first.
pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<Vec<Sale>>> {
    scope.require(Permission::UsePos)?;
    Ok(Json(state.db.sales().list_by_shop(scope.shop_id()).await?))
}

/// `GET sales/{id}/`
pub async fn get_sale(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleReceipt>> {
    scope.require(Permission::UsePos)?;
    state
        .db
        .sales()
        .get_receipt(scope.shop_id(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Sale", &id))
}

/// `POST sales/{id}/cancel/`: puts the goods back into stock.
pub async fn cancel_sale(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleReceipt>> {
    scope.require(Permission::ManageInventory)?;
    let receipt = state
        .db
        .sales()
        .cancel(scope.shop_id(), &id, scope.user_id())
        .await?;

    info!(sale_id = %id, by = %scope.user_id(), "Sale cancelled");
    Ok(Json(receipt))
}

/// `POST invoices/{id}/payments/`
pub async fn add_payment(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(invoice_id): Path<String>,
    ApiJson(payment): ApiJson<PaymentInput>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    scope.require(Permission::UsePos)?;
    payment.validate()?;

    let invoice = state
        .db
        .invoices()
        .add_payment(scope.shop_id(), &invoice_id, &payment)
        .await?;

    info!(
        invoice_id = %invoice.id,
        amount = %payment.amount(),
        status = ?invoice.status,
        "Payment recorded"
    );
    Ok((StatusCode::CREATED, Json(invoice)))
}
