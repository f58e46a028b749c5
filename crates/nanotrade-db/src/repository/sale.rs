//! # Sale Repository
//!
//! Checkout and cancellation of POS sales.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         checkout() - ONE TRANSACTION                    │
//! │                                                                         │
//! │  1. Re-read every product of the cart (price and SKU of record)         │
//! │  2. subtotal - discount = total; check the payment against the total    │
//! │  3. INSERT sale (pending, unpaid)                                       │
//! │  4. Split each line over the stock rows (given warehouse, or fullest    │
//! │     rows first); one sale_item + `sold` movement per row taken from     │
//! │  5. Not enough stock in the rows → InsufficientStock                    │
//! │  6. INSERT invoice + `sale` ledger entry                                │
//! │  7. Payment? INSERT payment + `payment` ledger entry; full → settle     │
//! │  8. Escrow requested? open ESCnnn for the paid amount                   │
//! │                                                                         │
//! │  Any failure rolls everything back: no partial sale, no lost stock.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation
//! Stock comes back through `returned` movements, the sale becomes
//! `cancelled`, an active escrow is dropped and the ledger gets reversing
//! entries. A sale whose escrow was already released cannot be cancelled.

use chrono::{DateTime, Utc};
use nanotrade_core::{
    new_id, Cart, CheckoutRequest, CoreError, DocumentType, Inventory, Money, MovementType,
    PaymentInput, PaymentStatus, Product, Sale, SaleItem, SaleReceipt, SaleStatus,
    TransactionType,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use crate::repository::escrow::{escrow_for_sale, open_escrow};
use crate::repository::inventory::{apply_movement, find_for_product, stock_rows, MovementRequest};
use crate::repository::ledger::{
    insert_invoice, insert_payment, invoice_for_sale, payments_for, record_transaction, settle,
    LedgerEntry,
};

/// One product line to sell.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub product_id: String,
    /// Warehouse to take the goods from; spread over the fullest rows when
    /// `None`.
    pub warehouse_id: Option<String>,
    pub quantity: i64,
}

/// Everything checkout needs, independent of where the cart lives.
#[derive(Debug, Clone)]
pub struct CheckoutRequestData {
    pub shop_id: String,
    pub seller_id: String,
    pub customer_id: Option<String>,
    pub lines: Vec<CheckoutLine>,
    /// Percentage discount in basis points.
    pub discount_bps: u32,
    pub promo_code: Option<String>,
    pub payment: Option<PaymentInput>,
    pub hold_in_escrow: bool,
}

impl CheckoutRequestData {
    /// Builds the checkout of a POS cart.
    pub fn from_cart(shop_id: &str, seller_id: &str, cart: &Cart, request: &CheckoutRequest) -> Self {
        CheckoutRequestData {
            shop_id: shop_id.to_string(),
            seller_id: seller_id.to_string(),
            customer_id: request.customer_id.clone(),
            lines: cart
                .items
                .iter()
                .map(|item| CheckoutLine {
                    product_id: item.product_id.clone(),
                    warehouse_id: item.warehouse_id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            discount_bps: cart.promo.as_ref().map_or(0, |p| p.discount_bps),
            promo_code: cart.promo.as_ref().map(|p| p.code.clone()),
            payment: request.payment.clone(),
            hold_in_escrow: request.hold_in_escrow,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Sales of a shop, newest first.
    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE shop_id = ?1 ORDER BY created_at DESC, receipt_number DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// A sale with its lines, invoice, payments and escrow.
    pub async fn get_receipt(&self, shop_id: &str, id: &str) -> DbResult<Option<SaleReceipt>> {
        let mut conn = self.pool.acquire().await?;
        load_receipt(&mut conn, shop_id, id).await
    }

    /// Turns a cart into a sale.
    ///
    /// ## Errors
    /// - `Rule(EmptyCart)` with no lines
    /// - `Rule(ProductNotFound)` for a product outside the shop
    /// - `Rule(OutOfStock)` when no warehouse stocks a product
    /// - `Rule(InsufficientStock)` when the named warehouse, or all rows of
    ///   the shop together, hold too little
    /// - `Rule(InvalidPaymentAmount)` for an overpayment, or an escrow sale
    ///   that is not paid in full
    pub async fn checkout(&self, request: &CheckoutRequestData) -> DbResult<SaleReceipt> {
        if request.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let mut tx = begin_write(&self.pool).await?;
        let shop_id = request.shop_id.as_str();

        if let Some(customer_id) = &request.customer_id {
            ensure_customer(&mut tx, shop_id, customer_id).await?;
        }

        // ----- Price the lines -----------------------------------------------
        let mut priced = Vec::with_capacity(request.lines.len());
        let mut subtotal = Money::zero();
        for line in &request.lines {
            let product = sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE id = ?1 AND shop_id = ?2",
            )
            .bind(&line.product_id)
            .bind(shop_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let line_total = product
                .price()
                .multiply_quantity(line.quantity)
                .map_err(CoreError::from)?;
            subtotal = subtotal.checked_add(line_total).map_err(CoreError::from)?;
            priced.push((line, product));
        }

        let discount = subtotal.percentage_of(request.discount_bps);
        let total = subtotal - discount;

        if let Some(payment) = &request.payment {
            if payment.amount_cents > total.cents() {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("payment of {} exceeds the total {}", payment.amount(), total),
                }
                .into());
            }
        }
        if request.hold_in_escrow {
            let paid = request.payment.as_ref().map_or(0, |p| p.amount_cents);
            if paid != total.cents() || total.is_zero() {
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("escrow requires the full total of {total} to be paid"),
                }
                .into());
            }
        }

        // ----- Sale and lines ------------------------------------------------
        let now = Utc::now();
        let sale = Sale {
            id: new_id(),
            shop_id: shop_id.to_string(),
            receipt_number: next_receipt_number(&mut tx, shop_id, now).await?,
            status: SaleStatus::Pending,
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            total_cents: total.cents(),
            seller_id: request.seller_id.clone(),
            customer_id: request.customer_id.clone(),
            payment_status: PaymentStatus::Unpaid,
            promo_code: request.promo_code.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        debug!(sale_id = %sale.id, receipt = %sale.receipt_number, lines = priced.len(), "Creating sale");

        insert_sale(&mut tx, &sale).await?;

        for (line, product) in &priced {
            for (inventory, quantity) in allocate(&mut tx, shop_id, product, line).await? {
                let item = SaleItem {
                    id: new_id(),
                    sale_id: sale.id.clone(),
                    product_id: product.id.clone(),
                    warehouse_id: inventory.warehouse_id.clone(),
                    sku_snapshot: product.sku.clone(),
                    name_snapshot: product.name.clone(),
                    unit_price_cents: product.price_cents,
                    quantity,
                    line_total_cents: product
                        .price()
                        .multiply_quantity(quantity)
                        .map_err(CoreError::from)?
                        .cents(),
                    created_at: now,
                };
                insert_item(&mut tx, &item).await?;

                let sold = MovementRequest {
                    movement_type: MovementType::Sold,
                    quantity,
                    supplier_id: None,
                    reason: Some(format!("Sale {}", sale.receipt_number)),
                    performed_by_id: request.seller_id.clone(),
                    sale_id: Some(sale.id.clone()),
                };
                apply_movement(&mut tx, &inventory, &product.sku, &sold).await?;
            }
        }

        // ----- Invoice, payment, ledger --------------------------------------
        let invoice = insert_invoice(&mut tx, &sale.id, sale.total_cents, now).await?;
        record_transaction(
            &mut tx,
            &LedgerEntry {
                shop_id,
                transaction_type: TransactionType::Sale,
                amount_cents: sale.total_cents,
                related_document_id: &sale.id,
                document_type: DocumentType::Sales,
                description: Some(format!("Sale {}", sale.receipt_number)),
            },
            now,
        )
        .await?;

        let paid = match &request.payment {
            Some(input) => {
                let payment = insert_payment(&mut tx, &invoice.id, input, now).await?;
                record_transaction(
                    &mut tx,
                    &LedgerEntry {
                        shop_id,
                        transaction_type: TransactionType::Payment,
                        amount_cents: payment.amount_cents,
                        related_document_id: &payment.id,
                        document_type: DocumentType::Payment,
                        description: Some(format!("Payment for sale {}", sale.receipt_number)),
                    },
                    now,
                )
                .await?;
                payment.amount_cents
            }
            None => 0,
        };
        if paid == sale.total_cents {
            settle(&mut tx, &invoice, now).await?;
        }

        if request.hold_in_escrow {
            open_escrow(&mut tx, shop_id, &sale.id, sale.total_cents, now).await?;
        }

        let receipt = load_receipt(&mut tx, shop_id, &sale.id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", &sale.id))?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            receipt = %sale.receipt_number,
            total_cents = sale.total_cents,
            status = receipt.sale.status.as_str(),
            "Checkout complete"
        );
        Ok(receipt)
    }

    /// Cancels a sale and puts its goods back on the shelf.
    ///
    /// ## Errors
    /// - `Rule(InvalidSaleStatus)` if the sale is already cancelled
    /// - `Rule(InvalidEscrowTransition)` if its escrow was released
    pub async fn cancel(&self, shop_id: &str, id: &str, performed_by_id: &str) -> DbResult<SaleReceipt> {
        let mut tx = begin_write(&self.pool).await?;

        let sale = find_in_shop(&mut tx, shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        if sale.status == SaleStatus::Cancelled {
            return Err(CoreError::InvalidSaleStatus {
                sale_id: sale.id.clone(),
                current_status: sale.status.as_str().to_string(),
            }
            .into());
        }

        if let Some(escrow) = escrow_for_sale(&mut tx, &sale.id).await? {
            if !escrow.state.is_active() {
                return Err(CoreError::InvalidEscrowTransition {
                    reference: escrow.reference.clone(),
                    from: escrow.state.to_string(),
                    to: "cancelled".to_string(),
                }
                .into());
            }
            sqlx::query("DELETE FROM escrows WHERE id = ?1")
                .bind(&escrow.id)
                .execute(&mut *tx)
                .await?;
        }

        // ----- Return the goods ----------------------------------------------
        for item in items_of(&mut tx, &sale.id).await? {
            let inventory =
                find_for_product(&mut tx, shop_id, &item.product_id, &item.warehouse_id)
                    .await?
                    .ok_or_else(|| {
                        DbError::conflict(format!(
                            "Inventory of {} in warehouse {} no longer exists",
                            item.sku_snapshot, item.warehouse_id
                        ))
                    })?;

            let returned = MovementRequest {
                movement_type: MovementType::Returned,
                quantity: item.quantity,
                supplier_id: None,
                reason: Some(format!("Sale {} cancelled", sale.receipt_number)),
                performed_by_id: performed_by_id.to_string(),
                sale_id: Some(sale.id.clone()),
            };
            apply_movement(&mut tx, &inventory, &item.sku_snapshot, &returned).await?;
        }

        // ----- Status and ledger ---------------------------------------------
        let now = Utc::now();
        let invoice = invoice_for_sale(&mut tx, &sale.id).await?;
        let refunded: i64 = match &invoice {
            Some(invoice) => payments_for(&mut tx, &invoice.id)
                .await?
                .iter()
                .map(|p| p.amount_cents)
                .sum(),
            None => 0,
        };
        let payment_status = if refunded > 0 {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::Unpaid
        };

        sqlx::query(
            "UPDATE sales SET status = 'cancelled', payment_status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(&sale.id)
        .bind(payment_status)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        record_transaction(
            &mut tx,
            &LedgerEntry {
                shop_id,
                transaction_type: TransactionType::Sale,
                amount_cents: -sale.total_cents,
                related_document_id: &sale.id,
                document_type: DocumentType::Sales,
                description: Some(format!("Sale {} cancelled", sale.receipt_number)),
            },
            now,
        )
        .await?;
        if refunded > 0 {
            record_transaction(
                &mut tx,
                &LedgerEntry {
                    shop_id,
                    transaction_type: TransactionType::Payment,
                    amount_cents: -refunded,
                    related_document_id: &sale.id,
                    document_type: DocumentType::Payment,
                    description: Some(format!("Refund for sale {}", sale.receipt_number)),
                },
                now,
            )
            .await?;
        }

        let receipt = load_receipt(&mut tx, shop_id, &sale.id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", &sale.id))?;

        tx.commit().await?;

        warn!(
            sale_id = %sale.id,
            receipt = %sale.receipt_number,
            refunded_cents = refunded,
            "Sale cancelled"
        );
        Ok(receipt)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Decides which stock rows a line is taken from, and how much from each.
///
/// A named warehouse must cover the line alone. Otherwise the fullest rows
/// are drained first, so stock spread over warehouses can still be sold.
async fn allocate(
    conn: &mut SqliteConnection,
    shop_id: &str,
    product: &Product,
    line: &CheckoutLine,
) -> DbResult<Vec<(Inventory, i64)>> {
    let out_of_stock = || CoreError::OutOfStock {
        sku: product.sku.clone(),
    };

    if let Some(warehouse_id) = &line.warehouse_id {
        let row = find_for_product(conn, shop_id, &product.id, warehouse_id)
            .await?
            .ok_or_else(out_of_stock)?;
        return Ok(vec![(row, line.quantity)]);
    }

    let rows = stock_rows(conn, shop_id, &product.id).await?;
    if rows.is_empty() {
        return Err(out_of_stock().into());
    }

    let available: i64 = rows.iter().map(|row| row.quantity.max(0)).sum();
    if available < line.quantity {
        return Err(CoreError::InsufficientStock {
            sku: product.sku.clone(),
            available,
            requested: line.quantity,
        }
        .into());
    }

    let mut remaining = line.quantity;
    let mut taken = Vec::new();
    for row in rows {
        if remaining == 0 {
            break;
        }
        let quantity = remaining.min(row.quantity);
        if quantity <= 0 {
            continue;
        }
        remaining -= quantity;
        taken.push((row, quantity));
    }
    Ok(taken)
}

/// `R-{date}-{shop prefix}-{daily counter}`
async fn next_receipt_number(
    conn: &mut SqliteConnection,
    shop_id: &str,
    at: DateTime<Utc>,
) -> DbResult<String> {
    let shop_prefix: String = shop_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase();
    let prefix = format!("R-{}-{}-", at.format("%Y%m%d"), shop_prefix);

    let today: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sales WHERE shop_id = ?1 AND receipt_number LIKE ?2 || '%'",
    )
    .bind(shop_id)
    .bind(&prefix)
    .fetch_one(&mut *conn)
    .await?;

    Ok(format!("{}{:04}", prefix, today + 1))
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, shop_id, receipt_number, status, subtotal_cents, discount_cents,
            total_cents, seller_id, customer_id, payment_status, promo_code,
            created_at, updated_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.shop_id)
    .bind(&sale.receipt_number)
    .bind(sale.status)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(&sale.seller_id)
    .bind(&sale.customer_id)
    .bind(sale.payment_status)
    .bind(&sale.promo_code)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.completed_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, warehouse_id, sku_snapshot, name_snapshot,
            unit_price_cents, quantity, line_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.warehouse_id)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.line_total_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn find_in_shop(conn: &mut SqliteConnection, shop_id: &str, id: &str) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1 AND shop_id = ?2")
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(sale)
}

async fn items_of(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        "SELECT * FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, rowid",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

async fn load_receipt(
    conn: &mut SqliteConnection,
    shop_id: &str,
    id: &str,
) -> DbResult<Option<SaleReceipt>> {
    let Some(sale) = find_in_shop(conn, shop_id, id).await? else {
        return Ok(None);
    };
    let items = items_of(conn, &sale.id).await?;
    let invoice = invoice_for_sale(conn, &sale.id)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", &sale.id))?;
    let payments = payments_for(conn, &invoice.id).await?;
    let escrow = escrow_for_sale(conn, &sale.id).await?;

    Ok(Some(SaleReceipt {
        sale,
        items,
        invoice,
        payments,
        escrow,
    }))
}

async fn ensure_customer(conn: &mut SqliteConnection, shop_id: &str, id: &str) -> DbResult<()> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM customers WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&mut *conn)
            .await?;
    found.map(|_| ()).ok_or_else(|| DbError::not_found("Customer", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{
        file_db, inventory_input, setup_shop, shop_input, stock_product, test_db, warehouse_input,
        Fixture,
    };
    use nanotrade_core::{EscrowState, InvoiceStatus, PaymentMethod, StockStatus};

    fn sell(fx: &Fixture, product_id: &str, quantity: i64) -> CheckoutRequestData {
        CheckoutRequestData {
            shop_id: fx.shop.id.clone(),
            seller_id: fx.owner.id.clone(),
            customer_id: None,
            lines: vec![CheckoutLine {
                product_id: product_id.to_string(),
                warehouse_id: None,
                quantity,
            }],
            discount_bps: 0,
            promo_code: None,
            payment: None,
            hold_in_escrow: false,
        }
    }

    fn cash(amount_cents: i64) -> Option<PaymentInput> {
        Some(PaymentInput {
            amount_cents,
            payment_method: PaymentMethod::Cash,
        })
    }

    #[tokio::test]
    async fn test_paid_checkout() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, inventory) = stock_product(&db, &fx, "OIL-5L", 20).await;

        let mut request = sell(&fx, &product.id, 4);
        request.payment = cash(40_000);
        let receipt = db.sales().checkout(&request).await.unwrap();

        assert_eq!(receipt.sale.subtotal_cents, 40_000);
        assert_eq!(receipt.sale.total_cents, 40_000);
        assert_eq!(receipt.sale.status, SaleStatus::Completed);
        assert_eq!(receipt.sale.payment_status, PaymentStatus::Paid);
        assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
        assert_eq!(receipt.payments.len(), 1);
        assert_eq!(receipt.items[0].sku_snapshot, "OIL-5L");
        assert!(receipt.escrow.is_none());
        assert!(receipt.sale.receipt_number.starts_with("R-"));
        assert!(receipt.sale.receipt_number.ends_with("-0001"));

        let movements = db.inventory().movements(&fx.shop.id, &inventory.id).await.unwrap();
        assert_eq!(movements[0].movement_type, MovementType::Sold);
        assert_eq!(movements[0].quantity, -4);
        assert_eq!(movements[0].quantity_after, 16);
        assert_eq!(movements[0].sale_id.as_deref(), Some(receipt.sale.id.as_str()));

        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir, 8).await;
        let fx = setup_shop(&db).await;
        let (product, inventory) = stock_product(&db, &fx, "OIL-5L", 10).await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let db = db.clone();
                let request = sell(&fx, &product.id, 1);
                tokio::spawn(async move { db.sales().checkout(&request).await })
            })
            .collect();

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(DbError::Rule(CoreError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected checkout failure: {other:?}"),
            }
        }
        assert_eq!(sold, 10);

        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 0);
        assert_eq!(product.status, StockStatus::OutOfStock);

        let inventory = db.inventory().get(&fx.shop.id, &inventory.id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity, 0);
        let movements = db.inventory().movements(&fx.shop.id, &inventory.id).await.unwrap();
        let sold_movements = movements
            .iter()
            .filter(|m| m.movement_type == MovementType::Sold)
            .count();
        assert_eq!(sold_movements, 10);
        assert_eq!(db.sales().list_by_shop(&fx.shop.id).await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_unpaid_checkout_stays_pending() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 20).await;

        let receipt = db.sales().checkout(&sell(&fx, &product.id, 2)).await.unwrap();

        assert_eq!(receipt.sale.status, SaleStatus::Pending);
        assert_eq!(receipt.sale.payment_status, PaymentStatus::Unpaid);
        assert_eq!(receipt.invoice.status, InvoiceStatus::Unpaid);
        assert!(receipt.payments.is_empty());
    }

    #[tokio::test]
    async fn test_promo_discount() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 20).await;

        let mut request = sell(&fx, &product.id, 3);
        request.discount_bps = 1_000;
        request.promo_code = Some("WELCOME10".to_string());
        let receipt = db.sales().checkout(&request).await.unwrap();

        assert_eq!(receipt.sale.subtotal_cents, 30_000);
        assert_eq!(receipt.sale.discount_cents, 3_000);
        assert_eq!(receipt.sale.total_cents, 27_000);
        assert_eq!(receipt.invoice.amount_cents, 27_000);
        assert_eq!(receipt.sale.promo_code.as_deref(), Some("WELCOME10"));
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (oil, _) = stock_product(&db, &fx, "OIL-5L", 20).await;
        let (rice, _) = stock_product(&db, &fx, "RICE-25KG", 1).await;

        let mut request = sell(&fx, &oil.id, 5);
        request.lines.push(CheckoutLine {
            product_id: rice.id.clone(),
            warehouse_id: None,
            quantity: 2,
        });

        let err = db.sales().checkout(&request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock { .. })
        ));

        let oil = db.products().get(&fx.shop.id, &oil.id).await.unwrap().unwrap();
        assert_eq!(oil.quantity, 20);
        assert!(db.sales().list_by_shop(&fx.shop.id).await.unwrap().is_empty());
        assert!(db.transactions().list_by_shop(&fx.shop.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unstocked_product_is_out_of_stock() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let product = db
            .products()
            .create(
                &fx.shop.id,
                &crate::repository::test_support::product_input("Salt", 500),
                "SALT-1KG",
                None,
            )
            .await
            .unwrap();

        let err = db.sales().checkout(&sell(&fx, &product.id, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::OutOfStock { .. })));
        assert_eq!(product.status, StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_fullest_warehouse_is_used() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 2).await;
        let depot = db
            .warehouses()
            .create(&fx.shop.id, &warehouse_input("Bonaberi"))
            .await
            .unwrap();
        db.inventory()
            .create(&fx.shop.id, &inventory_input(&product.id, &depot.id, 30), &fx.owner.id)
            .await
            .unwrap();

        let receipt = db.sales().checkout(&sell(&fx, &product.id, 5)).await.unwrap();
        assert_eq!(receipt.items[0].warehouse_id, depot.id);
    }

    #[tokio::test]
    async fn test_line_is_split_across_warehouses() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, central) = stock_product(&db, &fx, "OIL-5L", 5).await;
        let depot = db
            .warehouses()
            .create(&fx.shop.id, &warehouse_input("Bonaberi"))
            .await
            .unwrap();
        let depot_row = db
            .inventory()
            .create(&fx.shop.id, &inventory_input(&product.id, &depot.id, 5), &fx.owner.id)
            .await
            .unwrap();

        let mut request = sell(&fx, &product.id, 8);
        request.payment = cash(80_000);
        let receipt = db.sales().checkout(&request).await.unwrap();

        assert_eq!(receipt.items.len(), 2);
        assert_eq!(receipt.items.iter().map(|i| i.quantity).sum::<i64>(), 8);
        assert_eq!(receipt.items.iter().map(|i| i.line_total_cents).sum::<i64>(), 80_000);
        assert_eq!(receipt.sale.total_cents, 80_000);

        let central = db.inventory().get(&fx.shop.id, &central.id).await.unwrap().unwrap();
        let depot_row = db.inventory().get(&fx.shop.id, &depot_row.id).await.unwrap().unwrap();
        assert_eq!(central.quantity + depot_row.quantity, 2);
        assert!(central.quantity == 0 || depot_row.quantity == 0);
        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 2);

        // Cancelling puts every split line back in its own warehouse.
        db.sales().cancel(&fx.shop.id, &receipt.sale.id, &fx.owner.id).await.unwrap();
        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 10);
    }

    #[tokio::test]
    async fn test_split_reports_shortage_over_all_warehouses() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 5).await;
        let depot = db
            .warehouses()
            .create(&fx.shop.id, &warehouse_input("Bonaberi"))
            .await
            .unwrap();
        db.inventory()
            .create(&fx.shop.id, &inventory_input(&product.id, &depot.id, 5), &fx.owner.id)
            .await
            .unwrap();

        let err = db.sales().checkout(&sell(&fx, &product.id, 11)).await.unwrap_err();
        match err {
            DbError::Rule(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 10);
                assert_eq!(requested, 11);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // A named warehouse is not topped up from the others.
        let mut request = sell(&fx, &product.id, 6);
        request.lines[0].warehouse_id = Some(depot.id.clone());
        let err = db.sales().checkout(&request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock { .. })
        ));
    }

    #[tokio::test]
    async fn test_overpayment_and_partial_escrow_are_refused() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 20).await;

        let mut request = sell(&fx, &product.id, 1);
        request.payment = cash(10_001);
        let err = db.sales().checkout(&request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InvalidPaymentAmount { .. })
        ));

        request.payment = cash(5_000);
        request.hold_in_escrow = true;
        let err = db.sales().checkout(&request).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InvalidPaymentAmount { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_returns_stock_and_reverses_ledger() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, inventory) = stock_product(&db, &fx, "OIL-5L", 10).await;

        let mut request = sell(&fx, &product.id, 3);
        request.payment = cash(30_000);
        let receipt = db.sales().checkout(&request).await.unwrap();

        let cancelled = db
            .sales()
            .cancel(&fx.shop.id, &receipt.sale.id, &fx.owner.id)
            .await
            .unwrap();
        assert_eq!(cancelled.sale.status, SaleStatus::Cancelled);
        assert_eq!(cancelled.sale.payment_status, PaymentStatus::Refunded);

        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 10);
        let movements = db.inventory().movements(&fx.shop.id, &inventory.id).await.unwrap();
        assert_eq!(movements[0].movement_type, MovementType::Returned);
        assert_eq!(movements[0].quantity, 3);

        let ledger = db.transactions().list_by_shop(&fx.shop.id).await.unwrap();
        let sale_net: i64 = ledger
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Sale)
            .map(|t| t.amount_cents)
            .sum();
        assert_eq!(sale_net, 0);
        assert_eq!(db.transactions().balance(&fx.shop.id).await.unwrap(), Money::zero());

        let err = db
            .sales()
            .cancel(&fx.shop.id, &receipt.sale.id, &fx.owner.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InvalidSaleStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_after_release_is_refused() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 10).await;

        let mut request = sell(&fx, &product.id, 1);
        request.payment = cash(10_000);
        request.hold_in_escrow = true;
        let receipt = db.sales().checkout(&request).await.unwrap();
        let escrow = receipt.escrow.clone().unwrap();
        assert_eq!(escrow.state, EscrowState::AwaitingDelivery);

        db.escrows().confirm_delivery(&fx.shop.id, &escrow.id).await.unwrap();
        db.escrows().release(&fx.shop.id, &escrow.id).await.unwrap();

        let err = db
            .sales()
            .cancel(&fx.shop.id, &receipt.sale.id, &fx.owner.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InvalidEscrowTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_receipt_numbers_count_per_day() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 10).await;

        let first = db.sales().checkout(&sell(&fx, &product.id, 1)).await.unwrap();
        let second = db.sales().checkout(&sell(&fx, &product.id, 1)).await.unwrap();

        assert!(first.sale.receipt_number.ends_with("-0001"));
        assert!(second.sale.receipt_number.ends_with("-0002"));
        assert_eq!(db.sales().list_by_shop(&fx.shop.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_receipt_numbers_are_unique_per_shop() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 10).await;
        let receipt = db.sales().checkout(&sell(&fx, &product.id, 1)).await.unwrap();

        let other_shop = db
            .shops()
            .create(&fx.owner.id, &fx.business.id, &shop_input("Bonamoussadi Branch"))
            .await
            .unwrap();

        // Shops whose ids share a prefix produce the same receipt number.
        let mut conn = db.pool().acquire().await.unwrap();
        let mut same_number = receipt.sale.clone();
        same_number.id = new_id();
        same_number.shop_id = other_shop.id.clone();
        insert_sale(&mut conn, &same_number).await.unwrap();

        let mut duplicate = receipt.sale.clone();
        duplicate.id = new_id();
        let err = insert_sale(&mut conn, &duplicate).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_overflowing_line_is_refused() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 10).await;
        sqlx::query("UPDATE products SET price_cents = ?1 WHERE id = ?2")
            .bind(i64::MAX / 2)
            .bind(&product.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.sales().checkout(&sell(&fx, &product.id, 3)).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));
        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 10);
    }
}
