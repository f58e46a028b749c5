//! # Ledger Repositories
//!
//! Invoices, the payments made against them, and the append-only
//! transaction ledger of a shop.
//!
//! ## Money Flow
//! ```text
//! checkout ──► sale ──► invoice (amount = sale total)
//!                          │
//!                          ├── payment ──► transactions(payment, Payment)
//!                          ├── payment ──► transactions(payment, Payment)
//!                          │
//!                          └── Σ payments == amount → invoice paid, sale completed
//! ```

use chrono::{DateTime, Utc};
use nanotrade_core::{
    new_id, CoreError, DocumentType, Invoice, InvoiceStatus, Money, Payment, PaymentInput,
    SaleStatus, Transaction, TransactionType,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;

// =============================================================================
// Invoices
// =============================================================================

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        find_in_shop(&mut conn, shop_id, id).await
    }

    pub async fn get_by_sale(&self, sale_id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        invoice_for_sale(&mut conn, sale_id).await
    }

    /// Payments of an invoice, oldest first.
    pub async fn payments(&self, invoice_id: &str) -> DbResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        payments_for(&mut conn, invoice_id).await
    }

    /// Records a payment against an unpaid invoice.
    ///
    /// When the payments reach the invoice amount the invoice becomes paid
    /// and its sale completed.
    ///
    /// ## Errors
    /// - `Rule(InvalidSaleStatus)` if the sale was cancelled
    /// - `Rule(InvalidPaymentAmount)` if the invoice is settled or the
    ///   payment exceeds what is still owed
    pub async fn add_payment(
        &self,
        shop_id: &str,
        invoice_id: &str,
        input: &PaymentInput,
    ) -> DbResult<Invoice> {
        let mut tx = begin_write(&self.pool).await?;

        let invoice = find_in_shop(&mut tx, shop_id, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

        let sale_status: SaleStatus = sqlx::query_scalar("SELECT status FROM sales WHERE id = ?1")
            .bind(&invoice.sale_id)
            .fetch_one(&mut *tx)
            .await?;
        if sale_status == SaleStatus::Cancelled {
            return Err(CoreError::InvalidSaleStatus {
                sale_id: invoice.sale_id.clone(),
                current_status: sale_status.as_str().to_string(),
            }
            .into());
        }
        if invoice.status == InvoiceStatus::Paid {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "invoice is already paid".to_string(),
            }
            .into());
        }

        let paid = paid_cents(&mut tx, &invoice.id).await?;
        let outstanding = invoice.amount_cents - paid;
        if input.amount_cents > outstanding {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "payment of {} exceeds the outstanding {}",
                    Money::from_cents(input.amount_cents),
                    Money::from_cents(outstanding)
                ),
            }
            .into());
        }

        let now = Utc::now();
        let payment = insert_payment(&mut tx, &invoice.id, input, now).await?;
        record_transaction(
            &mut tx,
            &LedgerEntry {
                shop_id,
                transaction_type: TransactionType::Payment,
                amount_cents: payment.amount_cents,
                related_document_id: &payment.id,
                document_type: DocumentType::Payment,
                description: Some(format!("Payment on invoice {}", invoice.id)),
            },
            now,
        )
        .await?;

        if input.amount_cents == outstanding {
            settle(&mut tx, &invoice, now).await?;
        }

        let updated = find_in_shop(&mut tx, shop_id, &invoice.id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", &invoice.id))?;

        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            amount_cents = input.amount_cents,
            status = ?updated.status,
            "Payment recorded"
        );
        Ok(updated)
    }
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Ledger entries of a shop, newest first.
    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE shop_id = ?1
            ORDER BY transaction_date DESC, rowid DESC
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    /// Entries that point at one document (a sale, payment or expense).
    pub async fn for_document(&self, shop_id: &str, document_id: &str) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE shop_id = ?1 AND related_document_id = ?2
            ORDER BY transaction_date, rowid
            "#,
        )
        .bind(shop_id)
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(transactions)
    }

    /// Net of all sale and payment entries minus expenses.
    pub async fn balance(&self, shop_id: &str) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE transaction_type
                WHEN 'expense' THEN -amount_cents
                WHEN 'payment' THEN amount_cents
                ELSE 0 END), 0)
            FROM transactions WHERE shop_id = ?1
            "#,
        )
        .bind(shop_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_cents(cents))
    }
}

// =============================================================================
// Shared with the sale, expense and escrow repositories
// =============================================================================

/// A ledger line about to be written.
pub(crate) struct LedgerEntry<'a> {
    pub shop_id: &'a str,
    pub transaction_type: TransactionType,
    pub amount_cents: i64,
    pub related_document_id: &'a str,
    pub document_type: DocumentType,
    pub description: Option<String>,
}

pub(crate) async fn record_transaction(
    conn: &mut SqliteConnection,
    entry: &LedgerEntry<'_>,
    at: DateTime<Utc>,
) -> DbResult<Transaction> {
    let transaction = Transaction {
        id: new_id(),
        shop_id: entry.shop_id.to_string(),
        transaction_type: entry.transaction_type,
        amount_cents: entry.amount_cents,
        related_document_id: entry.related_document_id.to_string(),
        document_type: entry.document_type,
        description: entry.description.clone(),
        transaction_date: at,
    };

    debug!(
        id = %transaction.id,
        transaction_type = ?transaction.transaction_type,
        amount_cents = transaction.amount_cents,
        "Recording ledger entry"
    );

    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, shop_id, transaction_type, amount_cents, related_document_id,
            document_type, description, transaction_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&transaction.id)
    .bind(&transaction.shop_id)
    .bind(transaction.transaction_type)
    .bind(transaction.amount_cents)
    .bind(&transaction.related_document_id)
    .bind(transaction.document_type)
    .bind(&transaction.description)
    .bind(transaction.transaction_date)
    .execute(&mut *conn)
    .await?;

    Ok(transaction)
}

pub(crate) async fn insert_invoice(
    conn: &mut SqliteConnection,
    sale_id: &str,
    amount_cents: i64,
    at: DateTime<Utc>,
) -> DbResult<Invoice> {
    let invoice = Invoice {
        id: new_id(),
        sale_id: sale_id.to_string(),
        amount_cents,
        status: InvoiceStatus::Unpaid,
        created_at: at,
        updated_at: at,
    };

    sqlx::query(
        r#"
        INSERT INTO invoices (id, sale_id, amount_cents, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.sale_id)
    .bind(invoice.amount_cents)
    .bind(invoice.status)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(invoice)
}

pub(crate) async fn insert_payment(
    conn: &mut SqliteConnection,
    invoice_id: &str,
    input: &PaymentInput,
    at: DateTime<Utc>,
) -> DbResult<Payment> {
    let payment = Payment {
        id: new_id(),
        invoice_id: invoice_id.to_string(),
        amount_cents: input.amount_cents,
        payment_method: input.payment_method,
        payment_date: at,
    };

    sqlx::query(
        r#"
        INSERT INTO payments (id, invoice_id, amount_cents, payment_method, payment_date)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.invoice_id)
    .bind(payment.amount_cents)
    .bind(payment.payment_method)
    .bind(payment.payment_date)
    .execute(&mut *conn)
    .await?;

    Ok(payment)
}

/// Marks the invoice paid and its sale completed.
pub(crate) async fn settle(
    conn: &mut SqliteConnection,
    invoice: &Invoice,
    at: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query("UPDATE invoices SET status = 'paid', updated_at = ?2 WHERE id = ?1")
        .bind(&invoice.id)
        .bind(at)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        UPDATE sales
        SET status = 'completed', payment_status = 'paid', completed_at = ?2, updated_at = ?2
        WHERE id = ?1
        "#,
    )
    .bind(&invoice.sale_id)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    debug!(invoice_id = %invoice.id, sale_id = %invoice.sale_id, "Invoice settled");
    Ok(())
}

pub(crate) async fn invoice_for_sale(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE sale_id = ?1")
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(invoice)
}

pub(crate) async fn payments_for(
    conn: &mut SqliteConnection,
    invoice_id: &str,
) -> DbResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE invoice_id = ?1 ORDER BY payment_date, rowid",
    )
    .bind(invoice_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(payments)
}

async fn paid_cents(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<i64> {
    let paid: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE invoice_id = ?1")
            .bind(invoice_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(paid)
}

async fn find_in_shop(
    conn: &mut SqliteConnection,
    shop_id: &str,
    id: &str,
) -> DbResult<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT i.* FROM invoices i
        JOIN sales s ON s.id = i.sale_id
        WHERE i.id = ?1 AND s.shop_id = ?2
        "#,
    )
    .bind(id)
    .bind(shop_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(invoice)
}
