//! Customers, expenses and customer orders.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use nanotrade_core::{
    Customer, CustomerInput, Expense, ExpenseInput, ListParams, Order, OrderInput,
    OrderStatusUpdate, Page, Permission,
};
use tracing::info;

use super::to_page;
use crate::auth::ShopScope;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

// ===== Customers =====

/// `GET customers/`
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Customer>>> {
    scope.require(Permission::UsePos)?;
    let customers = state.db.customers().list_by_shop(scope.shop_id()).await?;
    Ok(Json(to_page(customers, &params)?))
}

/// `POST customers/create/`
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    scope.require(Permission::UsePos)?;
    input.validate()?;

    let customer = state.db.customers().create(scope.shop_id(), &input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// `PUT customers/{id}/update/`
pub async fn update_customer(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    scope.require(Permission::ManageCatalog)?;
    input.validate()?;

    Ok(Json(state.db.customers().update(scope.shop_id(), &id, &input).await?))
}

/// `DELETE customers/{id}/delete/`
pub async fn delete_customer(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    scope.require(Permission::ManageCatalog)?;
    state.db.customers().delete(scope.shop_id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Expenses =====

/// `GET expenses/`
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<Vec<Expense>>> {
    scope.require(Permission::ViewReports)?;
    Ok(Json(state.db.expenses().list_by_shop(scope.shop_id()).await?))
}

/// `POST expenses/create/`. Also booked as a debit in the ledger.
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(input): ApiJson<ExpenseInput>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    scope.require(Permission::ViewReports)?;
    input.validate()?;

    let expense = state.db.expenses().create(scope.shop_id(), &input).await?;
    info!(expense_id = %expense.id, amount_cents = expense.amount_cents, "Expense recorded");
    Ok((StatusCode::CREATED, Json(expense)))
}

// ===== Orders =====

/// `GET orders/`
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<Vec<Order>>> {
    scope.require(Permission::UsePos)?;
    Ok(Json(state.db.orders().list_by_shop(scope.shop_id()).await?))
}

/// `POST orders/create/`
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(input): ApiJson<OrderInput>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    scope.require(Permission::UsePos)?;
    input.validate()?;

    let order = state.db.orders().create(scope.shop_id(), &input).await?;
    info!(order_id = %order.id, product_id = %order.product_id, "Order placed");
    Ok((StatusCode::CREATED, Json(order)))
}

/// `PUT orders/{id}/status/`
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<OrderStatusUpdate>,
) -> ApiResult<Json<Order>> {
    scope.require(Permission::ManageInventory)?;

    let orders = state.db.orders();
    let mut order = orders
        .get(scope.shop_id(), &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", &id))?;

    if let Some(status) = update.delivery_status {
        order = orders.set_delivery_status(scope.shop_id(), &id, status).await?;
    }
    if let Some(status) = update.payment_status {
        order = orders.set_payment_status(scope.shop_id(), &id, status).await?;
    }
    Ok(Json(order))
}
