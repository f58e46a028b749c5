//! # Commerce Repositories
//!
//! Customers, delivery orders and shop expenses.

use chrono::Utc;
use nanotrade_core::{
    new_id, CoreError, Customer, CustomerInput, DeliveryStatus, DocumentType, Expense,
    ExpenseInput, Order, OrderInput, PaymentStatus, Product, TransactionType,
};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use crate::repository::ledger::{record_transaction, LedgerEntry};

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers WHERE shop_id = ?1
            ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }

    /// ## Errors
    /// `UniqueViolation` when the phone number is already a customer of the
    /// shop.
    pub async fn create(&self, shop_id: &str, input: &CustomerInput) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: new_id(),
            shop_id: shop_id.to_string(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            phone_number: input.phone_number.trim().to_string(),
            location: input.location.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, shop_id, first_name, last_name, phone_number, location, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.shop_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone_number)
        .bind(Json(&customer.location))
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(customer.phone_number.clone()))?;

        Ok(customer)
    }

    pub async fn update(&self, shop_id: &str, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        let existing = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        let customer = Customer {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            phone_number: input.phone_number.trim().to_string(),
            location: input.location.clone(),
            updated_at: Utc::now(),
            ..existing
        };

        sqlx::query(
            r#"
            UPDATE customers SET
                first_name = ?3, last_name = ?4, phone_number = ?5, location = ?6, updated_at = ?7
            WHERE id = ?1 AND shop_id = ?2
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.shop_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.phone_number)
        .bind(Json(&customer.location))
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(customer.phone_number.clone()))?;

        Ok(customer)
    }

    /// Deletes a customer; their sales and orders keep the history without
    /// the link.
    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE shop_id = ?1 ORDER BY created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Creates an order priced at the product's current price.
    ///
    /// Orders do not reserve stock; the goods leave the shelf when the
    /// order is rung up at the till.
    pub async fn create(&self, shop_id: &str, input: &OrderInput) -> DbResult<Order> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(&input.product_id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(input.product_id.clone()))?;

        if let Some(customer_id) = &input.customer_id {
            let found: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1 AND shop_id = ?2")
                    .bind(customer_id)
                    .bind(shop_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if found.is_none() {
                return Err(DbError::not_found("Customer", customer_id));
            }
        }

        let now = Utc::now();
        let order = Order {
            id: new_id(),
            shop_id: shop_id.to_string(),
            product_id: product.id.clone(),
            quantity: input.quantity,
            total_price_cents: product
                .price()
                .multiply_quantity(input.quantity)
                .map_err(CoreError::from)?
                .cents(),
            customer_id: input.customer_id.clone(),
            payment_status: PaymentStatus::Unpaid,
            delivery_status: DeliveryStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.id, sku = %product.sku, quantity = order.quantity, "Creating order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, shop_id, product_id, quantity, total_price_cents, customer_id,
                payment_status, delivery_status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(&order.shop_id)
        .bind(&order.product_id)
        .bind(order.quantity)
        .bind(order.total_price_cents)
        .bind(&order.customer_id)
        .bind(order.payment_status)
        .bind(order.delivery_status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    pub async fn set_delivery_status(
        &self,
        shop_id: &str,
        id: &str,
        status: DeliveryStatus,
    ) -> DbResult<Order> {
        let result = sqlx::query(
            "UPDATE orders SET delivery_status = ?3, updated_at = ?4 WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(id)
        .bind(shop_id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(order_id = %id, status = ?status, "Order delivery status changed");

        self.get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    pub async fn set_payment_status(
        &self,
        shop_id: &str,
        id: &str,
        status: PaymentStatus,
    ) -> DbResult<Order> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = ?3, updated_at = ?4 WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(id)
        .bind(shop_id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Expenses of a shop, latest expense date first.
    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT * FROM expenses WHERE shop_id = ?1 ORDER BY expense_date DESC, created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    /// Records an expense and its ledger entry together.
    pub async fn create(&self, shop_id: &str, input: &ExpenseInput) -> DbResult<Expense> {
        let mut tx = begin_write(&self.pool).await?;

        let now = Utc::now();
        let expense = Expense {
            id: new_id(),
            shop_id: shop_id.to_string(),
            description: input.description.trim().to_string(),
            amount_cents: input.amount_cents,
            expense_date: input.expense_date,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO expenses (id, shop_id, description, amount_cents, expense_date, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.shop_id)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.expense_date)
        .bind(expense.created_at)
        .execute(&mut *tx)
        .await?;

        record_transaction(
            &mut tx,
            &LedgerEntry {
                shop_id,
                transaction_type: TransactionType::Expense,
                amount_cents: expense.amount_cents,
                related_document_id: &expense.id,
                document_type: DocumentType::Expense,
                description: Some(expense.description.clone()),
            },
            now,
        )
        .await?;

        tx.commit().await?;

        info!(id = %expense.id, amount_cents = expense.amount_cents, "Expense recorded");
        Ok(expense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{setup_shop, stock_product, test_db};
    use chrono::NaiveDate;
    use nanotrade_core::{Location, Money};

    fn customer(phone: &str) -> CustomerInput {
        CustomerInput {
            first_name: "Ngono".to_string(),
            last_name: "Marie".to_string(),
            phone_number: phone.to_string(),
            location: Location::default(),
        }
    }

    #[tokio::test]
    async fn test_customer_phone_is_unique_per_shop() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;

        let created = db
            .customers()
            .create(&fx.shop.id, &customer("+237 677 00 11 22"))
            .await
            .unwrap();
        assert_eq!(created.full_name(), "Ngono Marie");

        let err = db
            .customers()
            .create(&fx.shop.id, &customer("+237 677 00 11 22"))
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { field, .. } => assert_eq!(field, "phone_number"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_order_priced_from_product() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 5).await;
        let buyer = db
            .customers()
            .create(&fx.shop.id, &customer("+237 677 00 11 22"))
            .await
            .unwrap();

        let order = db
            .orders()
            .create(
                &fx.shop.id,
                &OrderInput {
                    product_id: product.id.clone(),
                    quantity: 3,
                    customer_id: Some(buyer.id.clone()),
                },
            )
            .await
            .unwrap();
        assert_eq!(order.total_price_cents, 30_000);
        assert_eq!(order.delivery_status, DeliveryStatus::Pending);

        let shipped = db
            .orders()
            .set_delivery_status(&fx.shop.id, &order.id, DeliveryStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.delivery_status, DeliveryStatus::Shipped);

        let paid = db
            .orders()
            .set_payment_status(&fx.shop.id, &order.id, PaymentStatus::Paid)
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_order_for_unknown_product() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;

        let err = db
            .orders()
            .create(
                &fx.shop.id,
                &OrderInput {
                    product_id: new_id(),
                    quantity: 1,
                    customer_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_expense_lands_in_ledger() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;

        let expense = db
            .expenses()
            .create(
                &fx.shop.id,
                &ExpenseInput {
                    description: "Generator fuel".to_string(),
                    amount_cents: 2_500_000,
                    expense_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                },
            )
            .await
            .unwrap();

        let entries = db
            .transactions()
            .for_document(&fx.shop.id, &expense.id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].transaction_type, TransactionType::Expense);
        assert_eq!(entries[0].document_type, DocumentType::Expense);
        assert_eq!(
            db.transactions().balance(&fx.shop.id).await.unwrap(),
            Money::from_cents(-2_500_000)
        );
        assert_eq!(db.expenses().list_by_shop(&fx.shop.id).await.unwrap().len(), 1);
    }
}
