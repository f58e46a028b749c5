//! # HTTP Routes
//!
//! Every path lives under `/api/v1` and ends with a slash. All endpoints
//! except register, login and media need `Authorization: Token <jwt>`.
//! Shop-scoped endpoints act on `?shop=<id>` or the caller's first shop.

pub mod auth;
pub mod business;
pub mod catalog;
pub mod commerce;
pub mod health;
pub mod inventory;
pub mod pos;
pub mod reports;
pub mod sales;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use nanotrade_core::listing::{filter_by_search, page_size, paginate};
use nanotrade_core::validation::{validate_pagination, validate_search_query};
use nanotrade_core::{ListParams, Page, Searchable};

use crate::error::ApiResult;
use crate::media;
use crate::AppState;

/// Routes nested under `/api/v1`.
pub fn api_router() -> Router<Arc<AppState>> {
    let auth = Router::new()
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/auth/logout/", post(auth::logout))
        .route("/auth/me/", get(auth::me).put(auth::update_me));

    let business = Router::new()
        .route("/business/", get(business::get_business).post(business::create_business))
        .route("/business/{id}/update/", put(business::update_business))
        .route("/products/shops/", get(business::list_shops))
        .route("/shops/create/", post(business::create_shop))
        .route("/shops/{id}/", get(business::get_shop))
        .route("/shops/{id}/update/", put(business::update_shop))
        .route("/shops/{id}/delete/", delete(business::delete_shop))
        .route("/employees/", get(business::list_employees))
        .route("/employees/create/", post(business::create_employee))
        .route("/employees/{id}/delete/", delete(business::delete_employee));

    let catalog = Router::new()
        .route("/products/categories/", get(catalog::list_categories))
        .route("/categories/create/", post(catalog::create_category))
        .route("/categories/{id}/", get(catalog::get_category))
        .route("/categories/{id}/update/", put(catalog::update_category))
        .route("/categories/{id}/delete/", delete(catalog::delete_category))
        .route("/products/shop/", get(catalog::list_products))
        .route("/products/low-stock/", get(catalog::low_stock))
        .route("/products/create/", post(catalog::create_product))
        .route("/products/{id}/", get(catalog::get_product))
        .route("/products/{id}/update/", put(catalog::update_product))
        .route("/products/{id}/delete/", delete(catalog::delete_product))
        .route("/suppliers/", get(catalog::list_suppliers))
        .route("/suppliers/create/", post(catalog::create_supplier))
        .route("/suppliers/{id}/update/", put(catalog::update_supplier))
        .route("/suppliers/{id}/delete/", delete(catalog::delete_supplier));

    let inventory = Router::new()
        .route("/warehouses/", get(inventory::list_warehouses))
        .route("/warehouses/create/", post(inventory::create_warehouse))
        .route("/warehouses/{id}/", get(inventory::get_warehouse))
        .route("/warehouses/{id}/update/", put(inventory::update_warehouse))
        .route("/warehouses/{id}/delete/", delete(inventory::delete_warehouse))
        .route("/inventory/", get(inventory::list_inventory))
        .route("/inventory/create/", post(inventory::create_inventory))
        .route("/inventory/reorder/", get(inventory::reorder_suggestions))
        .route("/inventory/{id}/update/", put(inventory::update_inventory))
        .route("/inventory/{id}/delete/", delete(inventory::delete_inventory))
        .route(
            "/inventory/{id}/movements/",
            get(inventory::list_movements).post(inventory::record_movement),
        );

    let pos = Router::new()
        .route("/pos/cart/", get(pos::get_cart).delete(pos::clear_cart))
        .route("/pos/cart/items/", post(pos::add_item))
        .route(
            "/pos/cart/items/{product_id}/",
            put(pos::update_item).delete(pos::remove_item),
        )
        .route("/pos/cart/promo/", post(pos::apply_promo).delete(pos::clear_promo))
        .route("/pos/checkout/", post(pos::checkout));

    let sales = Router::new()
        .route("/sales/", get(sales::list_sales))
        .route("/sales/{id}/", get(sales::get_sale))
        .route("/sales/{id}/cancel/", post(sales::cancel_sale))
        .route("/invoices/{id}/payments/", post(sales::add_payment));

    let reports = Router::new()
        .route("/reports/escrow/", get(reports::escrow_report))
        .route("/reports/balance/", get(reports::balance))
        .route("/escrows/withdraw/", post(reports::withdraw))
        .route("/escrows/{id}/confirm/", post(reports::confirm_delivery))
        .route("/escrows/{id}/release/", post(reports::release))
        .route("/transactions/", get(reports::transactions));

    let commerce = Router::new()
        .route("/customers/", get(commerce::list_customers))
        .route("/customers/create/", post(commerce::create_customer))
        .route("/customers/{id}/update/", put(commerce::update_customer))
        .route("/customers/{id}/delete/", delete(commerce::delete_customer))
        .route("/expenses/", get(commerce::list_expenses))
        .route("/expenses/create/", post(commerce::create_expense))
        .route("/orders/", get(commerce::list_orders))
        .route("/orders/create/", post(commerce::create_order))
        .route("/orders/{id}/status/", put(commerce::update_order_status));

    Router::new()
        .merge(auth)
        .merge(business)
        .merge(catalog)
        .merge(inventory)
        .merge(pos)
        .merge(sales)
        .merge(reports)
        .merge(commerce)
        .route("/media/{file}", get(media::serve))
}

/// Searches and pages a full list the way every list screen does.
pub(crate) fn to_page<T: Searchable>(items: Vec<T>, params: &ListParams) -> ApiResult<Page<T>> {
    let term = validate_search_query(params.search.as_deref().unwrap_or_default())?;
    let page = params.page.unwrap_or(1);
    let per_page = page_size(params.per_page);
    validate_pagination(page, per_page)?;

    Ok(paginate(filter_by_search(items, &term), page, per_page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanotrade_core::Category;

    fn category(name: &str) -> Category {
        let now = chrono::Utc::now();
        Category {
            id: nanotrade_core::new_id(),
            shop_id: "shop".to_string(),
            name: name.to_string(),
            description: None,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_to_page_searches_then_pages() {
        let items = vec![category("Oils"), category("Rice"), category("Palm oil")];
        let params = ListParams {
            search: Some("oil".to_string()),
            per_page: Some(1),
            ..Default::default()
        };
        let page = to_page(items, &params).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_to_page_rejects_page_zero() {
        let params = ListParams {
            page: Some(0),
            ..Default::default()
        };
        assert!(to_page(vec![category("Oils")], &params).is_err());
    }
}
