//! Drives a real listener with `nanotrade-client`.

mod common;

use common::TestApp;
use nanotrade_client::{ApiClient, ClientConfig, ClientError, ImageUpload};
use nanotrade_core::{
    AddCartItemRequest, CheckoutRequest, InventoryInput, ListParams, PaymentInput, PaymentMethod,
    ProductInput, RegisterRequest, ShopInput, UserRole, WarehouseInput,
};
use tokio::net::TcpListener;

async fn spawn_server() -> (String, TestApp) {
    let app = TestApp::new().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}/api/v1", addr), app)
}

fn register_request(username: &str) -> RegisterRequest {
    serde_json::from_value(serde_json::json!({
        "username": username,
        "email": format!("{}@shop.cm", username),
        "password": "longenough",
    }))
    .unwrap()
}

#[tokio::test]
async fn test_client_sells_through_the_api() {
    let (base_url, _app) = spawn_server().await;
    let mut client = ApiClient::new(&ClientConfig::with_base_url(base_url)).unwrap();

    let health = client.health().await.unwrap();
    assert!(health.database);

    let login = client.register(&register_request("amina")).await.unwrap();
    assert_eq!(login.user.role, UserRole::ShopOwner);
    assert!(client.session().is_authenticated());

    let business: nanotrade_core::BusinessInput =
        serde_json::from_value(common::business_json()).unwrap();
    client.create_business(&business).await.unwrap();
    let shop = client
        .create_shop(&serde_json::from_value::<ShopInput>(serde_json::json!({ "name": "Akwa" })).unwrap())
        .await
        .unwrap();
    client.select_shop(Some(shop.id.clone()));

    let warehouse = client
        .create_warehouse(
            &serde_json::from_value::<WarehouseInput>(
                serde_json::json!({ "name": "Depot", "region": "Littoral" }),
            )
            .unwrap(),
        )
        .await
        .unwrap();

    let products = client
        .create_product(
            &ProductInput {
                name: "Palm Oil 5L".to_string(),
                price_cents: 650_000,
                purchase_price_cents: 520_000,
                ..Default::default()
            },
            Some(ImageUpload::new("oil.png", vec![0x89, b'P', b'N', b'G'])),
        )
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product.shop_id, shop.id);

    let image = client.media(product.image.as_deref().unwrap()).await.unwrap();
    assert_eq!(image, vec![0x89, b'P', b'N', b'G']);

    client
        .create_inventory(&InventoryInput {
            product_id: product.id.clone(),
            warehouse_id: warehouse.id.clone(),
            quantity: 12,
            minimum_stock_level: 2,
            maximum_stock_level: None,
            batch_number: None,
            expiration_date: None,
            notes: None,
            supplier_id: None,
        })
        .await
        .unwrap();

    let cart = client
        .add_to_cart(&AddCartItemRequest {
            product_id: product.id.clone(),
            quantity: 2,
            warehouse_id: None,
        })
        .await
        .unwrap();
    assert_eq!(cart.totals.total_cents, 1_300_000);

    let receipt = client
        .checkout(&CheckoutRequest {
            customer_id: None,
            payment: Some(PaymentInput {
                amount_cents: 1_300_000,
                payment_method: PaymentMethod::MobileMoney,
            }),
            hold_in_escrow: false,
        })
        .await
        .unwrap();
    assert_eq!(receipt.sale.total_cents, 1_300_000);

    let listed = client.products(&ListParams::default()).await.unwrap();
    assert_eq!(listed.items[0].quantity, 10);

    client.logout().await.unwrap();
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_client_surfaces_api_errors() {
    let (base_url, _app) = spawn_server().await;
    let mut client = ApiClient::new(&ClientConfig::with_base_url(base_url)).unwrap();

    let err = client.login("ghost", "longenough").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.code(), Some("UNAUTHORIZED"));

    client.register(&register_request("amina")).await.unwrap();
    let shops = client.shops().await.unwrap();
    assert!(shops.is_empty());

    let err = client.cart().await.unwrap_err();
    assert!(matches!(err, ClientError::Api { .. }));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn test_revoked_session_is_signed_out_on_restore() {
    let (base_url, _app) = spawn_server().await;
    let config = ClientConfig::with_base_url(base_url);
    let mut till = ApiClient::new(&config).unwrap();
    till.register(&register_request("amina")).await.unwrap();

    let mut back_office = ApiClient::with_session(&config, till.session().clone()).unwrap();
    let user = back_office.restore_session().await.unwrap();
    assert_eq!(user.map(|u| u.username), Some("amina".to_string()));

    till.logout().await.unwrap();

    assert!(back_office.restore_session().await.unwrap().is_none());
    assert!(!back_office.session().is_authenticated());
    assert!(matches!(
        back_office.me().await.unwrap_err(),
        ClientError::NotAuthenticated
    ));
}
