//! Escrow dashboard and the money ledger.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use nanotrade_core::escrow::split_active_completed;
use nanotrade_core::{
    BalanceReport, Escrow, EscrowReport, EscrowSummary, Permission, Transaction, WithdrawResponse,
};
use tracing::info;

use crate::auth::ShopScope;
use crate::error::ApiResult;
use crate::AppState;

/// `GET reports/escrow/`: summary totals plus the active and completed tabs.
pub async fn escrow_report(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<EscrowReport>> {
    scope.require(Permission::ViewReports)?;

    let escrows = state.db.escrows().list_by_shop(scope.shop_id()).await?;
    let summary = EscrowSummary::from_escrows(&escrows);
    let (active, completed) = split_active_completed(escrows);

    Ok(Json(EscrowReport {
        currency: state.config.currency.clone(),
        summary,
        active,
        completed,
    }))
}

/// `POST escrows/{id}/confirm/`
pub async fn confirm_delivery(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<Json<Escrow>> {
    scope.require(Permission::ManageEscrow)?;
    let escrow = state.db.escrows().confirm_delivery(scope.shop_id(), &id).await?;

    info!(escrow = %escrow.reference, "Delivery confirmed");
    Ok(Json(escrow))
}

/// `POST escrows/{id}/release/`
pub async fn release(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<Json<Escrow>> {
    scope.require(Permission::ManageEscrow)?;
    let escrow = state.db.escrows().release(scope.shop_id(), &id).await?;

    info!(escrow = %escrow.reference, "Escrow released");
    Ok(Json(escrow))
}

/// `POST escrows/withdraw/`: withdraws every released escrow at once.
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<WithdrawResponse>> {
    scope.require(Permission::ManageEscrow)?;
    let withdrawn = state.db.escrows().withdraw_all(scope.shop_id()).await?;
    let amount_cents: i64 = withdrawn.iter().map(|e| e.amount_cents).sum();

    info!(count = withdrawn.len(), amount_cents, "Escrow funds withdrawn");
    Ok(Json(WithdrawResponse {
        withdrawn,
        amount_cents,
    }))
}

/// `GET transactions/`
pub async fn transactions(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<Vec<Transaction>>> {
    scope.require(Permission::ViewReports)?;
    Ok(Json(state.db.transactions().list_by_shop(scope.shop_id()).await?))
}

/// `GET reports/balance/`
pub async fn balance(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<BalanceReport>> {
    scope.require(Permission::ViewReports)?;
    let balance = state.db.transactions().balance(scope.shop_id()).await?;

    Ok(Json(BalanceReport {
        currency: state.config.currency.clone(),
        balance_cents: balance.cents(),
    }))
}
