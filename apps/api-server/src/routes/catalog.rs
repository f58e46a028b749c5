//! Categories, products and suppliers of a shop.
//!
//! Category and product forms are multipart so an image can travel with
//! them; suppliers are plain JSON.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use nanotrade_core::{
    generate_sku, Category, CategoryInput, ListParams, Page, Permission, Product, ProductInput,
    Supplier, SupplierInput,
};
use tracing::info;
use uuid::Uuid;

use super::to_page;
use crate::auth::ShopScope;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, FormData};
use crate::AppState;

// =============================================================================
// Categories
// =============================================================================

/// `GET products/categories/`
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Category>>> {
    let categories = state.db.categories().list_by_shop(scope.shop_id()).await?;
    Ok(Json(to_page(categories, &params)?))
}

/// `GET categories/{id}/`
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    state
        .db
        .categories()
        .get(scope.shop_id(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category", &id))
}

/// `POST categories/create/` (multipart: name, description, image)
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Category>)> {
    scope.require(Permission::ManageCatalog)?;
    let form = FormData::read(multipart).await?;
    let input = category_input(&form)?;

    let image = state.media.save_optional(form.image.as_ref()).await?;
    let category = state
        .db
        .categories()
        .create(scope.shop_id(), &input, image)
        .await?;

    info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT categories/{id}/update/` (multipart). Without an image the current
/// one is kept.
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<Category>> {
    scope.require(Permission::ManageCatalog)?;
    let form = FormData::read(multipart).await?;
    let input = category_input(&form)?;

    let image = state.media.save_optional(form.image.as_ref()).await?;
    let category = state
        .db
        .categories()
        .update(scope.shop_id(), &id, &input, image)
        .await?;
    Ok(Json(category))
}

/// `DELETE categories/{id}/delete/`
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    scope.require(Permission::ManageCatalog)?;
    state.db.categories().delete(scope.shop_id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn category_input(form: &FormData) -> ApiResult<CategoryInput> {
    let input = CategoryInput {
        name: form.required("name")?,
        description: form.text("description"),
    };
    input.validate()?;
    Ok(input)
}

// =============================================================================
// Products
// =============================================================================

/// `GET products/shop/`
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Product>>> {
    let products = state.db.products().list_by_shop(scope.shop_id()).await?;
    Ok(Json(to_page(products, &params)?))
}

/// `GET products/low-stock/`
pub async fn low_stock(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().low_stock(scope.shop_id()).await?))
}

/// `GET products/{id}/`
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get(scope.shop_id(), &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

/// `POST products/create/` (multipart)
///
/// Creates the product in every shop listed in `shops` (the current shop
/// when none is given). All copies share the SKU and the image, and either
/// every copy is created or none is.
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Vec<Product>>)> {
    scope.require(Permission::ManageCatalog)?;
    let form = FormData::read(multipart).await?;
    let input = product_input(&form)?;

    let targets = if input.shops.is_empty() {
        vec![scope.shop_id().to_string()]
    } else {
        input.shops.clone()
    };

    let shops = state.db.shops();
    for shop_id in &targets {
        if shops.get_for_user(shop_id, scope.user_id()).await?.is_none() {
            return Err(ApiError::not_found("Shop", shop_id));
        }
    }

    let sku = match &input.sku {
        Some(sku) => sku.clone(),
        None => generate_sku(&input.name, &sku_suffix()),
    };
    let image = state.media.save_optional(form.image.as_ref()).await?;

    let created = state
        .db
        .products()
        .create_in_shops(&targets, &input, &sku, image)
        .await?;
    for product in &created {
        info!(product_id = %product.id, shop_id = %product.shop_id, sku = %product.sku, "Product created");
    }

    Ok((StatusCode::CREATED, Json(created)))
}

/// `PUT products/{id}/update/` (multipart)
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<Product>> {
    scope.require(Permission::ManageCatalog)?;
    let form = FormData::read(multipart).await?;
    let input = product_input(&form)?;

    let image = state.media.save_optional(form.image.as_ref()).await?;
    let product = state
        .db
        .products()
        .update(scope.shop_id(), &id, &input, image)
        .await?;
    Ok(Json(product))
}

/// `DELETE products/{id}/delete/`
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    scope.require(Permission::ManageCatalog)?;
    state.db.products().delete(scope.shop_id(), &id).await?;

    info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn product_input(form: &FormData) -> ApiResult<ProductInput> {
    let price_cents = form.money("price")?.ok_or_else(|| {
        ApiError::from(nanotrade_core::ValidationError::Required {
            field: "price".to_string(),
        })
    })?;

    let input = ProductInput {
        name: form.required("name")?,
        sku: form.text("sku").map(|sku| sku.to_ascii_uppercase()),
        price_cents,
        purchase_price_cents: form.money("purchase_price")?.unwrap_or(0),
        description: form.text("description"),
        category_id: form.text("category"),
        reorder_level: form.integer("reorder_level")?,
        unit_type: form.text("unit_type"),
        shops: form.all("shops"),
    };
    input.validate()?;
    Ok(input)
}

/// Four hex digits to keep generated SKUs apart.
fn sku_suffix() -> String {
    Uuid::new_v4().simple().to_string()[..4].to_string()
}

// =============================================================================
// Suppliers
// =============================================================================

/// `GET suppliers/`
pub async fn list_suppliers(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Page<Supplier>>> {
    let suppliers = state.db.suppliers().list_by_shop(scope.shop_id()).await?;
    Ok(Json(to_page(suppliers, &params)?))
}

/// `POST suppliers/create/`
pub async fn create_supplier(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    ApiJson(input): ApiJson<SupplierInput>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    scope.require(Permission::ManageCatalog)?;
    input.validate()?;

    let supplier = state.db.suppliers().create(scope.shop_id(), &input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// `PUT suppliers/{id}/update/`
pub async fn update_supplier(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<SupplierInput>,
) -> ApiResult<Json<Supplier>> {
    scope.require(Permission::ManageCatalog)?;
    input.validate()?;

    Ok(Json(state.db.suppliers().update(scope.shop_id(), &id, &input).await?))
}

/// `DELETE suppliers/{id}/delete/`
pub async fn delete_supplier(
    State(state): State<Arc<AppState>>,
    scope: ShopScope,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    scope.require(Permission::ManageCatalog)?;
    state.db.suppliers().delete(scope.shop_id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
