//! # API Client
//!
//! One async method per `/api/v1` endpoint.
//!
//! ```text
//! ApiClient::products(&params)
//!      │
//!      ▼
//! GET {base}/products/shop/?search=oil&page=2&shop=<id>
//!     Authorization: Token <session token>
//!      │
//!      ├── 2xx ──► serde_json ──► Page<Product>
//!      └── 4xx/5xx ──► {code, message} ──► ClientError::Api
//! ```
//!
//! Category and product forms go out as `multipart/form-data` with the
//! image as an `image` file part; every other body is JSON.

use std::path::Path;
use std::time::Duration;

use nanotrade_core::{
    AddCartItemRequest, BalanceReport, BusinessInformation, BusinessInput, CartResponse,
    Category, CategoryInput, CheckoutRequest, Customer, CustomerInput, Employee, EmployeeInput,
    Escrow, EscrowReport, Expense, ExpenseInput, HealthResponse, Inventory, InventoryInput,
    InventoryRow, InventoryUpdate, Invoice, ListParams, LoginRequest, LoginResponse, Money,
    MovementInput, Order, OrderInput, OrderStatusUpdate, Page, PaymentInput, Product,
    ProductInput, PromoRequest, RegisterRequest, ReorderSuggestion, Sale, SaleReceipt, Shop,
    ShopInput, StockMovement, Supplier, SupplierInput, Transaction, UpdateCartItemRequest,
    UpdateProfileRequest, User, Warehouse, WarehouseInput, WithdrawResponse,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::AuthSession;

/// An image picked for a category or product form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageUpload {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(ImageUpload { file_name, bytes })
    }

    /// MIME type guessed from the file extension.
    pub fn content_type(&self) -> &'static str {
        let extension = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        }
    }

    fn into_part(self) -> ClientResult<Part> {
        let mime = self.content_type();
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(mime)?)
    }
}

/// Typed client for the NanoTrade REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: AuthSession,
    shop: Option<String>,
}

impl ApiClient {
    /// Builds a client from configuration, restoring the session file when
    /// one is configured.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let session = match &config.session_file {
            Some(path) => AuthSession::load(path)?,
            None => AuthSession::in_memory(),
        };
        Self::with_session(config, session)
    }

    pub fn with_session(config: &ClientConfig, session: AuthSession) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(ApiClient {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            session,
            shop: None,
        })
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Scopes later shop requests to `shop_id` (`?shop=`). `None` goes back
    /// to the user's primary shop.
    pub fn select_shop(&mut self, shop_id: Option<String>) {
        self.shop = shop_id;
    }

    pub fn selected_shop(&self) -> Option<&str> {
        self.shop.as_deref()
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.session.token().ok_or(ClientError::NotAuthenticated)?;
        let mut builder = self
            .http
            .request(method, self.url(path))
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", token));
        if let Some(shop) = &self.shop {
            builder = builder.query(&[("shop", shop)]);
        }
        Ok(builder)
    }

    fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> ClientResult<T> {
        let response = Self::checked(builder).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(builder: RequestBuilder) -> ClientResult<()> {
        Self::checked(builder).await?;
        Ok(())
    }

    async fn checked(builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = %status, "API response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_body(status, body))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        Self::send(self.request(Method::GET, path)?).await
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str, params: &ListParams) -> ClientResult<T> {
        Self::send(self.request(Method::GET, path)?.query(params)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        Self::send(self.request(Method::POST, path)?.json(body)).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        Self::send(self.request(Method::POST, path)?).await
    }

    async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        Self::send(self.request(Method::PUT, path)?.json(body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        Self::send_empty(self.request(Method::DELETE, path)?).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Creates an account and signs in with it.
    pub async fn register(&mut self, request: &RegisterRequest) -> ClientResult<LoginResponse> {
        let response: LoginResponse =
            Self::send(self.public(Method::POST, "auth/register/").json(request)).await?;
        self.session.sign_in(response.clone())?;
        Ok(response)
    }

    /// Signs in with a username (or email) and password.
    pub async fn login(&mut self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse =
            Self::send(self.public(Method::POST, "auth/login/").json(&request)).await?;
        self.session.sign_in(response.clone())?;
        Ok(response)
    }

    /// Revokes the token on the server and clears the local session.
    ///
    /// The local session is cleared even if the server call fails.
    pub async fn logout(&mut self) -> ClientResult<()> {
        let revoked = match self.request(Method::POST, "auth/logout/") {
            Ok(builder) => Self::send_empty(builder).await,
            Err(e) => Err(e),
        };
        self.session.sign_out()?;
        self.shop = None;
        revoked
    }

    pub async fn me(&self) -> ClientResult<User> {
        self.get("auth/me/").await
    }

    /// Checks a restored session against the server.
    ///
    /// A token the server no longer accepts (401) signs the session out and
    /// returns `None`; a valid one refreshes the stored user.
    pub async fn restore_session(&mut self) -> ClientResult<Option<User>> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }
        match self.me().await {
            Ok(user) => {
                self.session.set_user(user.clone())?;
                Ok(Some(user))
            }
            Err(err) if err.is_unauthorized() => {
                warn!("Stored session rejected by the server, signing out");
                self.session.sign_out()?;
                self.shop = None;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn update_profile(&mut self, update: &UpdateProfileRequest) -> ClientResult<User> {
        let user: User = self.put("auth/me/", update).await?;
        self.session.set_user(user.clone())?;
        Ok(user)
    }

    // =========================================================================
    // Business, shops, employees
    // =========================================================================

    pub async fn business(&self) -> ClientResult<BusinessInformation> {
        self.get("business/").await
    }

    pub async fn create_business(&mut self, input: &BusinessInput) -> ClientResult<BusinessInformation> {
        let business: BusinessInformation = self.post("business/", input).await?;
        self.session.set_business(business.clone())?;
        Ok(business)
    }

    pub async fn update_business(
        &mut self,
        id: &str,
        input: &BusinessInput,
    ) -> ClientResult<BusinessInformation> {
        let business: BusinessInformation =
            self.put(&format!("business/{}/update/", id), input).await?;
        self.session.set_business(business.clone())?;
        Ok(business)
    }

    pub async fn shops(&self) -> ClientResult<Vec<Shop>> {
        self.get("products/shops/").await
    }

    pub async fn create_shop(&self, input: &ShopInput) -> ClientResult<Shop> {
        self.post("shops/create/", input).await
    }

    pub async fn shop(&self, id: &str) -> ClientResult<Shop> {
        self.get(&format!("shops/{}/", id)).await
    }

    pub async fn update_shop(&self, id: &str, input: &ShopInput) -> ClientResult<Shop> {
        self.put(&format!("shops/{}/update/", id), input).await
    }

    pub async fn delete_shop(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("shops/{}/delete/", id)).await
    }

    pub async fn employees(&self) -> ClientResult<Vec<Employee>> {
        self.get("employees/").await
    }

    pub async fn create_employee(&self, input: &EmployeeInput) -> ClientResult<Employee> {
        self.post("employees/create/", input).await
    }

    pub async fn delete_employee(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("employees/{}/delete/", id)).await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn categories(&self, params: &ListParams) -> ClientResult<Page<Category>> {
        self.get_list("products/categories/", params).await
    }

    pub async fn category(&self, id: &str) -> ClientResult<Category> {
        self.get(&format!("categories/{}/", id)).await
    }

    pub async fn create_category(
        &self,
        input: &CategoryInput,
        image: Option<ImageUpload>,
    ) -> ClientResult<Category> {
        let form = multipart_form(category_fields(input), image)?;
        Self::send(self.request(Method::POST, "categories/create/")?.multipart(form)).await
    }

    pub async fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
        image: Option<ImageUpload>,
    ) -> ClientResult<Category> {
        let form = multipart_form(category_fields(input), image)?;
        let path = format!("categories/{}/update/", id);
        Self::send(self.request(Method::PUT, &path)?.multipart(form)).await
    }

    pub async fn delete_category(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("categories/{}/delete/", id)).await
    }

    pub async fn products(&self, params: &ListParams) -> ClientResult<Page<Product>> {
        self.get_list("products/shop/", params).await
    }

    pub async fn product(&self, id: &str) -> ClientResult<Product> {
        self.get(&format!("products/{}/", id)).await
    }

    /// Creates the product in every shop listed in `input.shops` (or the
    /// current shop) and returns one product per shop.
    pub async fn create_product(
        &self,
        input: &ProductInput,
        image: Option<ImageUpload>,
    ) -> ClientResult<Vec<Product>> {
        let form = multipart_form(product_fields(input), image)?;
        Self::send(self.request(Method::POST, "products/create/")?.multipart(form)).await
    }

    pub async fn update_product(
        &self,
        id: &str,
        input: &ProductInput,
        image: Option<ImageUpload>,
    ) -> ClientResult<Product> {
        let form = multipart_form(product_fields(input), image)?;
        let path = format!("products/{}/update/", id);
        Self::send(self.request(Method::PUT, &path)?.multipart(form)).await
    }

    pub async fn delete_product(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("products/{}/delete/", id)).await
    }

    pub async fn low_stock_products(&self) -> ClientResult<Vec<Product>> {
        self.get("products/low-stock/").await
    }

    pub async fn suppliers(&self, params: &ListParams) -> ClientResult<Page<Supplier>> {
        self.get_list("suppliers/", params).await
    }

    pub async fn create_supplier(&self, input: &SupplierInput) -> ClientResult<Supplier> {
        self.post("suppliers/create/", input).await
    }

    pub async fn update_supplier(&self, id: &str, input: &SupplierInput) -> ClientResult<Supplier> {
        self.put(&format!("suppliers/{}/update/", id), input).await
    }

    pub async fn delete_supplier(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("suppliers/{}/delete/", id)).await
    }

    // =========================================================================
    // Warehouses & inventory
    // =========================================================================

    pub async fn warehouses(&self, params: &ListParams) -> ClientResult<Page<Warehouse>> {
        self.get_list("warehouses/", params).await
    }

    pub async fn warehouse(&self, id: &str) -> ClientResult<Warehouse> {
        self.get(&format!("warehouses/{}/", id)).await
    }

    pub async fn create_warehouse(&self, input: &WarehouseInput) -> ClientResult<Warehouse> {
        self.post("warehouses/create/", input).await
    }

    pub async fn update_warehouse(&self, id: &str, input: &WarehouseInput) -> ClientResult<Warehouse> {
        self.put(&format!("warehouses/{}/update/", id), input).await
    }

    pub async fn delete_warehouse(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("warehouses/{}/delete/", id)).await
    }

    pub async fn inventory(&self, params: &ListParams) -> ClientResult<Page<InventoryRow>> {
        self.get_list("inventory/", params).await
    }

    pub async fn create_inventory(&self, input: &InventoryInput) -> ClientResult<Inventory> {
        self.post("inventory/create/", input).await
    }

    pub async fn update_inventory(&self, id: &str, update: &InventoryUpdate) -> ClientResult<Inventory> {
        self.put(&format!("inventory/{}/update/", id), update).await
    }

    pub async fn delete_inventory(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("inventory/{}/delete/", id)).await
    }

    pub async fn record_movement(&self, inventory_id: &str, input: &MovementInput) -> ClientResult<StockMovement> {
        self.post(&format!("inventory/{}/movements/", inventory_id), input)
            .await
    }

    pub async fn movements(&self, inventory_id: &str) -> ClientResult<Vec<StockMovement>> {
        self.get(&format!("inventory/{}/movements/", inventory_id)).await
    }

    pub async fn reorder_suggestions(&self) -> ClientResult<Vec<ReorderSuggestion>> {
        self.get("inventory/reorder/").await
    }

    // =========================================================================
    // POS
    // =========================================================================

    pub async fn cart(&self) -> ClientResult<CartResponse> {
        self.get("pos/cart/").await
    }

    pub async fn add_to_cart(&self, request: &AddCartItemRequest) -> ClientResult<CartResponse> {
        self.post("pos/cart/items/", request).await
    }

    pub async fn update_cart_item(
        &self,
        product_id: &str,
        request: &UpdateCartItemRequest,
    ) -> ClientResult<CartResponse> {
        self.put(&format!("pos/cart/items/{}/", product_id), request)
            .await
    }

    pub async fn remove_from_cart(&self, product_id: &str) -> ClientResult<CartResponse> {
        let path = format!("pos/cart/items/{}/", product_id);
        Self::send(self.request(Method::DELETE, &path)?).await
    }

    pub async fn clear_cart(&self) -> ClientResult<CartResponse> {
        Self::send(self.request(Method::DELETE, "pos/cart/")?).await
    }

    pub async fn apply_promo(&self, code: &str) -> ClientResult<CartResponse> {
        let request = PromoRequest {
            code: code.to_string(),
        };
        self.post("pos/cart/promo/", &request).await
    }

    pub async fn clear_promo(&self) -> ClientResult<CartResponse> {
        Self::send(self.request(Method::DELETE, "pos/cart/promo/")?).await
    }

    pub async fn checkout(&self, request: &CheckoutRequest) -> ClientResult<SaleReceipt> {
        self.post("pos/checkout/", request).await
    }

    // =========================================================================
    // Sales & invoices
    // =========================================================================

    pub async fn sales(&self) -> ClientResult<Vec<Sale>> {
        self.get("sales/").await
    }

    pub async fn sale(&self, id: &str) -> ClientResult<SaleReceipt> {
        self.get(&format!("sales/{}/", id)).await
    }

    pub async fn cancel_sale(&self, id: &str) -> ClientResult<SaleReceipt> {
        self.post_empty(&format!("sales/{}/cancel/", id)).await
    }

    pub async fn add_payment(&self, invoice_id: &str, payment: &PaymentInput) -> ClientResult<Invoice> {
        self.post(&format!("invoices/{}/payments/", invoice_id), payment)
            .await
    }

    // =========================================================================
    // Reports & escrow
    // =========================================================================

    pub async fn escrow_report(&self) -> ClientResult<EscrowReport> {
        self.get("reports/escrow/").await
    }

    pub async fn confirm_delivery(&self, escrow_id: &str) -> ClientResult<Escrow> {
        self.post_empty(&format!("escrows/{}/confirm/", escrow_id)).await
    }

    pub async fn release_escrow(&self, escrow_id: &str) -> ClientResult<Escrow> {
        self.post_empty(&format!("escrows/{}/release/", escrow_id)).await
    }

    pub async fn withdraw_escrow(&self) -> ClientResult<WithdrawResponse> {
        self.post_empty("escrows/withdraw/").await
    }

    pub async fn transactions(&self) -> ClientResult<Vec<Transaction>> {
        self.get("transactions/").await
    }

    pub async fn balance(&self) -> ClientResult<BalanceReport> {
        self.get("reports/balance/").await
    }

    // =========================================================================
    // Customers, expenses, orders
    // =========================================================================

    pub async fn customers(&self, params: &ListParams) -> ClientResult<Page<Customer>> {
        self.get_list("customers/", params).await
    }

    pub async fn create_customer(&self, input: &CustomerInput) -> ClientResult<Customer> {
        self.post("customers/create/", input).await
    }

    pub async fn update_customer(&self, id: &str, input: &CustomerInput) -> ClientResult<Customer> {
        self.put(&format!("customers/{}/update/", id), input).await
    }

    pub async fn delete_customer(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("customers/{}/delete/", id)).await
    }

    pub async fn expenses(&self) -> ClientResult<Vec<Expense>> {
        self.get("expenses/").await
    }

    pub async fn create_expense(&self, input: &ExpenseInput) -> ClientResult<Expense> {
        self.post("expenses/create/", input).await
    }

    pub async fn orders(&self) -> ClientResult<Vec<Order>> {
        self.get("orders/").await
    }

    pub async fn create_order(&self, input: &OrderInput) -> ClientResult<Order> {
        self.post("orders/create/", input).await
    }

    pub async fn update_order_status(&self, id: &str, update: &OrderStatusUpdate) -> ClientResult<Order> {
        self.put(&format!("orders/{}/status/", id), update).await
    }

    // =========================================================================
    // Misc
    // =========================================================================

    /// Downloads an uploaded image by the path stored on the record
    /// (`media/<file>`).
    pub async fn media(&self, image_path: &str) -> ClientResult<Vec<u8>> {
        let response = Self::checked(self.public(Method::GET, image_path)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        let root = self.base_url.trim_end_matches("/api/v1");
        let response = self.http.get(format!("{}/health", root)).send().await?;
        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_body(status, body));
        }
        Ok(response.json().await?)
    }
}

// =============================================================================
// Form encoding
// =============================================================================

fn category_fields(input: &CategoryInput) -> Vec<(&'static str, String)> {
    let mut fields = vec![("name", input.name.clone())];
    if let Some(description) = &input.description {
        fields.push(("description", description.clone()));
    }
    fields
}

/// Text parts of the product form. Prices travel as decimal strings.
fn product_fields(input: &ProductInput) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("name", input.name.clone()),
        ("price", Money::from_cents(input.price_cents).to_string()),
        (
            "purchase_price",
            Money::from_cents(input.purchase_price_cents).to_string(),
        ),
    ];
    if let Some(sku) = &input.sku {
        fields.push(("sku", sku.clone()));
    }
    if let Some(description) = &input.description {
        fields.push(("description", description.clone()));
    }
    if let Some(category_id) = &input.category_id {
        fields.push(("category", category_id.clone()));
    }
    if let Some(level) = input.reorder_level {
        fields.push(("reorder_level", level.to_string()));
    }
    if let Some(unit_type) = &input.unit_type {
        fields.push(("unit_type", unit_type.clone()));
    }
    for shop in &input.shops {
        fields.push(("shops", shop.clone()));
    }
    fields
}

fn multipart_form(
    fields: Vec<(&'static str, String)>,
    image: Option<ImageUpload>,
) -> ClientResult<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    if let Some(image) = image {
        form = form.part("image", image.into_part()?);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_fields_encode_prices_as_decimals() {
        let input = ProductInput {
            name: "Palm Oil 5L".to_string(),
            price_cents: 650_050,
            purchase_price_cents: 520_000,
            shops: vec!["a".to_string(), "b".to_string()],
            ..Default::default()
        };
        let fields = product_fields(&input);

        assert!(fields.contains(&("price", "6500.50".to_string())));
        assert!(fields.contains(&("purchase_price", "5200.00".to_string())));
        assert_eq!(fields.iter().filter(|(name, _)| *name == "shops").count(), 2);
        assert!(!fields.iter().any(|(name, _)| *name == "sku"));
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(ImageUpload::new("logo.PNG", vec![]).content_type(), "image/png");
        assert_eq!(ImageUpload::new("a.jpeg", vec![]).content_type(), "image/jpeg");
        assert_eq!(
            ImageUpload::new("noext", vec![]).content_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new(&ClientConfig::with_base_url("http://localhost:8000/api/v1/")).unwrap();
        assert_eq!(
            client.url("/products/shop/"),
            "http://localhost:8000/api/v1/products/shop/"
        );
    }

    #[tokio::test]
    async fn test_signed_out_calls_fail_locally() {
        let client = ApiClient::new(&ClientConfig::default()).unwrap();
        let err = client.products(&ListParams::default()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_image_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rice.jpg");
        tokio::fs::write(&path, b"\xFF\xD8\xFF").await.unwrap();

        let upload = ImageUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "rice.jpg");
        assert_eq!(upload.bytes.len(), 3);
        assert_eq!(upload.content_type(), "image/jpeg");
    }
}
