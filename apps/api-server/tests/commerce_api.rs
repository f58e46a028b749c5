mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_customers_crud_and_search() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    let created = app
        .post(
            "/api/v1/customers/create/",
            &token,
            json!({ "first_name": "Brice", "last_name": "Nkoulou", "phone_number": "+237 677 00 11 22" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let id = created.body["id"].as_str().unwrap().to_string();

    let duplicate = app
        .post(
            "/api/v1/customers/create/",
            &token,
            json!({ "first_name": "Other", "last_name": "Person", "phone_number": "+237 677 00 11 22" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/v1/customers/{}/update/", id),
            Some(&token),
            Some(json!({ "first_name": "Brice", "last_name": "Mbarga", "phone_number": "+237 677 00 11 22" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["last_name"], "Mbarga");

    let found = app.get("/api/v1/customers/?search=mbar", &token).await;
    assert_eq!(found.body["total"], 1);

    let deleted = app
        .call(
            Method::DELETE,
            &format!("/api/v1/customers/{}/delete/", id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let listed = app.get("/api/v1/customers/", &token).await;
    assert_eq!(listed.body["total"], 0);
}

#[tokio::test]
async fn test_order_is_priced_and_moves_through_statuses() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;
    let product = app.create_product(&token, "Palm Oil 5L", "1000").await;

    let order = app
        .post(
            "/api/v1/orders/create/",
            &token,
            json!({ "product_id": product["id"], "quantity": 3 }),
        )
        .await;
    assert_eq!(order.status, StatusCode::CREATED, "{}", order.body);
    assert_eq!(order.body["total_price_cents"], 300_000);
    assert_eq!(order.body["delivery_status"], "pending");
    let id = order.body["id"].as_str().unwrap();

    let updated = app
        .call(
            Method::PUT,
            &format!("/api/v1/orders/{}/status/", id),
            Some(&token),
            Some(json!({ "delivery_status": "delivered", "payment_status": "paid" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["delivery_status"], "delivered");
    assert_eq!(updated.body["payment_status"], "paid");

    let listed = app.get("/api/v1/orders/", &token).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    let response = app
        .call(
            Method::PUT,
            "/api/v1/orders/00000000-0000-0000-0000-000000000000/status/",
            Some(&token),
            Some(json!({ "delivery_status": "shipped" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "NOT_FOUND");
}
