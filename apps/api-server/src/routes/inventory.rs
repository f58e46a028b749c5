//! Warehouses, stock rows and stock movements.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use nanotrade_core::{
    Inventory, InventoryInput, InventoryRow, InventoryUpdate, ListParams, MovementInput, Page,
    Permission, ReorderSuggestion, StockMovement, Warehouse, WarehouseInput,
};
use nanotrade_db::MovementRequest;
use tracing::info;

use super::to_page;
use crate::auth::ShopScope;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

// =============================================================================
// Warehouses
// =============================================================================

/// `GET warehouses/`
pub async fn list_warehouses(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Warehouse>>> {
    let warehouses = state.db.warehouses().list_by_shop(scope.shop_id()).await?;
    Ok(Json(to_page(warehouses, &params)?))
}

/// `GET warehouses/{id}/`
pub async fn get_warehouse(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<Json<Warehouse>> {
    state
        .db
        .warehouses()
        .get(scope.shop_id(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Warehouse", &id))
}

/// `POST warehouses/create/`
pub async fn create_warehouse(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(input): ApiJson<WarehouseInput>,
) -> ApiResult<(StatusCode, Json<Warehouse>)> {
    scope.require(Permission::ManageInventory)?;
    input.validate()?;

    let warehouse = state.db.warehouses().create(scope.shop_id(), &input).await?;
    info!(warehouse_id = %warehouse.id, name = %warehouse.name, "Warehouse created");
    Ok((StatusCode::CREATED, Json(warehouse)))
}

/// `PUT warehouses/{id}/update/`
pub async fn update_warehouse(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<WarehouseInput>,
) -> ApiResult<Json<Warehouse>> {
    scope.require(Permission::ManageInventory)?;
    input.validate()?;

    Ok(Json(state.db.warehouses().update(scope.shop_id(), &id, &input).await?))
}

/// `DELETE warehouses/{id}/delete/`. Stock rows of the warehouse go with it.
pub async fn delete_warehouse(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    scope.require(Permission::ManageInventory)?;
    state.db.warehouses().delete(scope.shop_id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Inventory
// =============================================================================

/// `GET inventory/`: rows joined with product and warehouse names, each
/// with its stock status.
pub async fn list_inventory(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<InventoryRow>>> {
    let lines = state.db.inventory().list_lines(scope.shop_id()).await?;
    Ok(Json(to_page(lines, &params)?.map(InventoryRow::from)))
}

/// `POST inventory/create/`
pub async fn create_inventory(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(input): ApiJson<InventoryInput>,
) -> ApiResult<(StatusCode, Json<Inventory>)> {
    scope.require(Permission::ManageInventory)?;
    input.validate()?;

    let inventory = state
        .db
        .inventory()
        .create(scope.shop_id(), &input, scope.user_id())
        .await?;
    Ok((StatusCode::CREATED, Json(inventory)))
}

/// `PUT inventory/{id}/update/`
pub async fn update_inventory(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<InventoryUpdate>,
) -> ApiResult<Json<Inventory>> {
    scope.require(Permission::ManageInventory)?;
    update.validate()?;

    Ok(Json(state.db.inventory().update(scope.shop_id(), &id, &update).await?))
}

/// `DELETE inventory/{id}/delete/`
pub async fn delete_inventory(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    scope.require(Permission::ManageInventory)?;
    state.db.inventory().delete(scope.shop_id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST inventory/{id}/movements/`
pub async fn record_movement(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<MovementInput>,
) -> ApiResult<(StatusCode, Json<StockMovement>)> {
    scope.require(Permission::ManageInventory)?;
    input.validate()?;

    let request = MovementRequest::from_input(&input, scope.user_id());
    let movement = state
        .db
        .inventory()
        .record_movement(scope.shop_id(), &id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// `GET inventory/{id}/movements/`, newest first.
pub async fn list_movements(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<StockMovement>>> {
    Ok(Json(state.db.inventory().movements(scope.shop_id(), &id).await?))
}

/// `GET inventory/reorder/`
pub async fn reorder_suggestions(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<Vec<ReorderSuggestion>>> {
    scope.require(Permission::ManageInventory)?;
    Ok(Json(state.db.inventory().reorder_suggestions(scope.shop_id()).await?))
}
