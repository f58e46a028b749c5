//! Business profile, shops and the staff employed in them.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nanotrade_core::{BusinessInformation, BusinessInput, Employee, EmployeeInput, Permission, Shop, ShopInput};
use tracing::info;

use super::auth::business_for;
use crate::auth::{CurrentUser, ShopScope};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

// =============================================================================
// Business
// =============================================================================

/// `GET business/`
pub async fn get_business(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<BusinessInformation>> {
    business_for(&state, &current.user)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Business", current.id()))
}

/// `POST business/`
pub async fn create_business(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(input): ApiJson<BusinessInput>,
) -> ApiResult<(StatusCode, Json<BusinessInformation>)> {
    current.require(Permission::ManageShop)?;
    input.validate()?;

    let businesses = state.db.businesses();
    if businesses.get_by_owner(current.id()).await?.is_some() {
        return Err(ApiError::conflict("Business information already registered"));
    }

    let business = businesses.create(current.id(), &input).await?;
    info!(business_id = %business.id, owner_id = %current.id(), "Business registered");
    Ok((StatusCode::CREATED, Json(business)))
}

/// `PUT business/{id}/update/`
pub async fn update_business(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<BusinessInput>,
) -> ApiResult<Json<BusinessInformation>> {
    current.require(Permission::ManageShop)?;
    input.validate()?;

    let business = state.db.businesses().update(&id, current.id(), &input).await?;
    Ok(Json(business))
}

// =============================================================================
// Shops
// =============================================================================

/// `GET products/shops/`: shops the caller owns or works at.
pub async fn list_shops(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<Shop>>> {
    Ok(Json(state.db.shops().list_for_user(current.id()).await?))
}

/// `GET shops/{id}/`
pub async fn get_shop(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Shop>> {
    state
        .db
        .shops()
        .get_for_user(&id, current.id())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Shop", &id))
}

/// `POST shops/create/`. The owner must have registered a business first.
pub async fn create_shop(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(input): ApiJson<ShopInput>,
) -> ApiResult<(StatusCode, Json<Shop>)> {
    current.require(Permission::ManageShop)?;
    input.validate()?;

    let business = state
        .db
        .businesses()
        .get_by_owner(current.id())
        .await?
        .ok_or_else(|| ApiError::business("Register your business first"))?;

    let shop = state.db.shops().create(current.id(), &business.id, &input).await?;
    info!(shop_id = %shop.id, name = %shop.name, "Shop created");
    Ok((StatusCode::CREATED, Json(shop)))
}

/// `PUT shops/{id}/update/`
pub async fn update_shop(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ShopInput>,
) -> ApiResult<Json<Shop>> {
    current.require(Permission::ManageShop)?;
    input.validate()?;

    Ok(Json(state.db.shops().update(&id, current.id(), &input).await?))
}

/// `DELETE shops/{id}/delete/`
pub async fn delete_shop(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    current.require(Permission::ManageShop)?;
    state.db.shops().delete(&id, current.id()).await?;

    info!(shop_id = %id, "Shop deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Employees
// =============================================================================

/// `GET employees/`
pub async fn list_employees(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<Vec<Employee>>> {
    scope.require(Permission::ManageStaff)?;
    Ok(Json(state.db.employees().list_by_shop(scope.shop_id()).await?))
}

/// `POST employees/create/`
pub async fn create_employee(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(input): ApiJson<EmployeeInput>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    scope.require(Permission::ManageStaff)?;
    input.validate()?;

    let employee = state.db.employees().create(scope.shop_id(), &input).await?;
    info!(shop_id = %scope.shop_id(), user_id = %employee.user_id, "Employee hired");
    Ok((StatusCode::CREATED, Json(employee)))
}

/// `DELETE employees/{id}/delete/`
pub async fn delete_employee(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    scope.require(Permission::ManageStaff)?;
    state.db.employees().delete(scope.shop_id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
