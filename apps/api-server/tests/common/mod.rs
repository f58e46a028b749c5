//! Test harness: an in-memory server driven through `tower::ServiceExt`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use nanotrade_api::{build_router, AppState, ServerConfig};
use nanotrade_db::{Database, DbConfig};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "nanotrade-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    _media: TempDir,
}

/// Response status and the decoded JSON body (`Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn error_code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            media_dir: media.path().to_path_buf(),
            ..ServerConfig::default()
        };
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = Arc::new(AppState::new(db, config));

        TestApp {
            router: build_router(state.clone()),
            state,
            _media: media,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body, bytes }
    }

    pub async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, path: &str, token: &str) -> TestResponse {
        self.call(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.call(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn post_empty(&self, path: &str, token: &str) -> TestResponse {
        self.call(Method::POST, path, Some(token), None).await
    }

    /// Sends a multipart form; `image` is `(file name, bytes)`.
    pub async fn multipart(
        &self,
        method: Method,
        path: &str,
        token: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> TestResponse {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Token {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    // ===== Fixtures =====

    /// Registers a user and returns `(token, user id)`.
    pub async fn register(&self, username: &str, role: &str) -> (String, String) {
        let response = self
            .call(
                Method::POST,
                "/api/v1/auth/register/",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@shop.cm", username),
                    "password": "longenough",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        (
            response.body["token"].as_str().unwrap().to_string(),
            response.body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// A shop owner with a registered business and one shop: `(token, shop id)`.
    pub async fn owner_with_shop(&self, username: &str) -> (String, String) {
        let (token, _) = self.register(username, "shop_owner").await;

        let business = self.post("/api/v1/business/", &token, business_json()).await;
        assert_eq!(business.status, StatusCode::CREATED, "{}", business.body);

        let shop = self
            .post("/api/v1/shops/create/", &token, json!({ "name": "Marché Central" }))
            .await;
        assert_eq!(shop.status, StatusCode::CREATED, "{}", shop.body);

        (token, shop.body["id"].as_str().unwrap().to_string())
    }

    pub async fn create_warehouse(&self, token: &str, name: &str) -> String {
        let response = self
            .post(
                "/api/v1/warehouses/create/",
                token,
                json!({ "name": name, "region": "Littoral" }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Creates a product in the current shop and returns it.
    pub async fn create_product(&self, token: &str, name: &str, price: &str) -> Value {
        let response = self
            .multipart(
                Method::POST,
                "/api/v1/products/create/",
                token,
                &[("name", name), ("price", price), ("purchase_price", "100")],
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body[0].clone()
    }

    /// Puts `quantity` units of a product into a warehouse.
    pub async fn stock(&self, token: &str, product_id: &str, warehouse_id: &str, quantity: i64) -> Value {
        let response = self
            .post(
                "/api/v1/inventory/create/",
                token,
                json!({
                    "product_id": product_id,
                    "warehouse_id": warehouse_id,
                    "quantity": quantity,
                    "minimum_stock_level": 2,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}

pub fn business_json() -> Value {
    json!({
        "full_business_name": "Amina Distribution SARL",
        "business_type": "Retail",
        "address": {
            "street": "Rue Joss",
            "city": "Douala",
            "state": "Littoral",
            "country": "Cameroon",
            "postal_code": "00237"
        },
        "number_of_employees": 4,
        "tax_id_number": "M0123456789",
        "contact_info": {
            "phone": "+237 699 000 111",
            "email": "contact@amina.cm"
        },
        "legal_structure": "SARL",
        "year_established": 2015,
        "industry_category": "Groceries"
    })
}
