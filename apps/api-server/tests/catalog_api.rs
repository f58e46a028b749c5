mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[tokio::test]
async fn test_category_with_image_is_served_back() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    let created = app
        .multipart(
            Method::POST,
            "/api/v1/categories/create/",
            &token,
            &[("name", "Oils"), ("description", "Cooking oils")],
            Some(("oils.png", PNG)),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);

    let image = created.body["image"].as_str().unwrap().to_string();
    assert!(image.starts_with("media/"));
    assert!(image.ends_with(".png"));

    let served = app
        .call(Method::GET, &format!("/api/v1/{}", image), None, None)
        .await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.bytes, PNG);
}

#[tokio::test]
async fn test_category_rejects_non_image_upload() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    let created = app
        .multipart(
            Method::POST,
            "/api/v1/categories/create/",
            &token,
            &[("name", "Oils")],
            Some(("notes.txt", b"hello")),
        )
        .await;
    assert_eq!(created.status, StatusCode::BAD_REQUEST);
    assert_eq!(created.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_product_prices_and_generated_sku() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    let product = app.create_product(&token, "Palm Oil 5L", "6500.50").await;
    assert_eq!(product["price_cents"], 650_050);
    assert_eq!(product["quantity"], 0);
    assert_eq!(product["status"], "out_of_stock");
    assert!(product["sku"].as_str().unwrap().starts_with("PALM-OIL-5L-"));
}

#[tokio::test]
async fn test_duplicate_sku_conflicts() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    let fields = [("name", "Rice 25kg"), ("price", "18000"), ("sku", "RICE-25")];
    let first = app
        .multipart(Method::POST, "/api/v1/products/create/", &token, &fields, None)
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .multipart(Method::POST, "/api/v1/products/create/", &token, &fields, None)
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_multi_shop_create_commits_nothing_on_conflict() {
    let app = TestApp::new().await;
    let (token, first_shop) = app.owner_with_shop("amina").await;
    let second = app
        .post("/api/v1/shops/create/", &token, json!({ "name": "Bonaberi Depot" }))
        .await;
    assert_eq!(second.status, StatusCode::CREATED, "{}", second.body);
    let second_shop = second.body["id"].as_str().unwrap().to_string();

    let taken = app
        .multipart(
            Method::POST,
            &format!("/api/v1/products/create/?shop={second_shop}"),
            &token,
            &[("name", "Rice 25kg"), ("price", "18000"), ("sku", "RICE-25")],
            None,
        )
        .await;
    assert_eq!(taken.status, StatusCode::CREATED, "{}", taken.body);

    let both = app
        .multipart(
            Method::POST,
            "/api/v1/products/create/",
            &token,
            &[
                ("name", "Rice 25kg"),
                ("price", "18000"),
                ("sku", "RICE-25"),
                ("shops", first_shop.as_str()),
                ("shops", second_shop.as_str()),
            ],
            None,
        )
        .await;
    assert_eq!(both.status, StatusCode::CONFLICT);

    let listed = app
        .get(&format!("/api/v1/products/shop/?shop={first_shop}"), &token)
        .await;
    assert_eq!(listed.body["total"], 0);
}

#[tokio::test]
async fn test_product_list_search_and_pages() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    for name in ["Palm Oil 5L", "Groundnut Oil 1L", "Rice 25kg", "Sugar 1kg"] {
        app.create_product(&token, name, "1000").await;
    }

    let oils = app.get("/api/v1/products/shop/?search=oil", &token).await;
    assert_eq!(oils.status, StatusCode::OK);
    assert_eq!(oils.body["total"], 2);

    let page = app.get("/api/v1/products/shop/?page=2&per_page=3", &token).await;
    assert_eq!(page.body["total"], 4);
    assert_eq!(page.body["total_pages"], 2);
    assert_eq!(page.body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_product_update_keeps_image_when_none_sent() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    let created = app
        .multipart(
            Method::POST,
            "/api/v1/products/create/",
            &token,
            &[("name", "Palm Oil 5L"), ("price", "6500")],
            Some(("oil.png", PNG)),
        )
        .await;
    let product = &created.body[0];
    let id = product["id"].as_str().unwrap();

    let updated = app
        .multipart(
            Method::PUT,
            &format!("/api/v1/products/{}/update/", id),
            &token,
            &[("name", "Palm Oil 5 litres"), ("price", "7000")],
            None,
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["price_cents"], 700_000);
    assert_eq!(updated.body["image"], product["image"]);
}

#[tokio::test]
async fn test_seller_cannot_manage_catalog() {
    let app = TestApp::new().await;
    let (owner, _) = app.owner_with_shop("amina").await;
    let (seller, seller_id) = app.register("paul", "seller").await;

    let hired = app
        .post(
            "/api/v1/employees/create/",
            &owner,
            json!({
                "user_id": seller_id,
                "national_id": "CM-778812",
                "date_of_birth": "1998-04-02",
                "hire_date": "2023-01-09",
                "employment_status": "full_time"
            }),
        )
        .await;
    assert_eq!(hired.status, StatusCode::CREATED, "{}", hired.body);

    let listing = app.get("/api/v1/products/shop/", &seller).await;
    assert_eq!(listing.status, StatusCode::OK);

    let create = app
        .multipart(
            Method::POST,
            "/api/v1/products/create/",
            &seller,
            &[("name", "Palm Oil 5L"), ("price", "6500")],
            None,
        )
        .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);
    assert_eq!(create.error_code(), "FORBIDDEN");
}

#[tokio::test]
async fn test_suppliers_crud() {
    let app = TestApp::new().await;
    let (token, _) = app.owner_with_shop("amina").await;

    let created = app
        .post(
            "/api/v1/suppliers/create/",
            &token,
            json!({ "name": "Sodecoton", "email": "sales@sodecoton.cm" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let id = created.body["id"].as_str().unwrap();

    let listed = app.get("/api/v1/suppliers/?search=sodeco", &token).await;
    assert_eq!(listed.body["total"], 1);

    let deleted = app
        .call(
            Method::DELETE,
            &format!("/api/v1/suppliers/{}/delete/", id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let listed = app.get("/api/v1/suppliers/", &token).await;
    assert_eq!(listed.body["total"], 0);
}

#[tokio::test]
async fn test_other_owners_shop_is_not_found() {
    let app = TestApp::new().await;
    let (_, shop_a) = app.owner_with_shop("amina").await;
    let (token_b, _) = app.owner_with_shop("brice").await;

    let response = app
        .get(&format!("/api/v1/products/shop/?shop={}", shop_a), &token_b)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
