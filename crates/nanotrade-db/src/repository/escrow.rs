//! # Escrow Repository
//!
//! Persists the escrow state machine of [`nanotrade_core::escrow`].
//!
//! Every transition is loaded, checked by the core method and written back
//! with the old state in the `WHERE` clause, so two concurrent releases of
//! the same escrow cannot both succeed.

use chrono::{DateTime, Utc};
use nanotrade_core::escrow::escrow_reference;
use nanotrade_core::{new_id, CoreResult, Escrow, EscrowState};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;

#[derive(Debug, Clone)]
pub struct EscrowRepository {
    pool: SqlitePool,
}

impl EscrowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EscrowRepository { pool }
    }

    /// Escrows of a shop, newest first.
    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Escrow>> {
        let escrows = sqlx::query_as::<_, Escrow>(
            "SELECT * FROM escrows WHERE shop_id = ?1 ORDER BY created_at DESC, reference DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(escrows)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Escrow>> {
        let escrow = sqlx::query_as::<_, Escrow>("SELECT * FROM escrows WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(escrow)
    }

    /// `awaiting_delivery` → `pending_release`
    pub async fn confirm_delivery(&self, shop_id: &str, id: &str) -> DbResult<Escrow> {
        self.transition(shop_id, id, Escrow::confirm_delivery).await
    }

    /// `pending_release` → `released`
    pub async fn release(&self, shop_id: &str, id: &str) -> DbResult<Escrow> {
        self.transition(shop_id, id, Escrow::release).await
    }

    /// Withdraws every released escrow of the shop at once.
    ///
    /// Returns the escrows that moved to `withdrawn`; empty when nothing was
    /// available.
    pub async fn withdraw_all(&self, shop_id: &str) -> DbResult<Vec<Escrow>> {
        let mut tx = begin_write(&self.pool).await?;

        let released = sqlx::query_as::<_, Escrow>(
            "SELECT * FROM escrows WHERE shop_id = ?1 AND state = 'released' ORDER BY reference",
        )
        .bind(shop_id)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        let mut withdrawn = Vec::with_capacity(released.len());
        for mut escrow in released {
            let from = escrow.state;
            escrow.withdraw(now)?;
            persist(&mut tx, &escrow, from).await?;
            withdrawn.push(escrow);
        }

        tx.commit().await?;

        let amount_cents: i64 = withdrawn.iter().map(|e| e.amount_cents).sum();
        info!(shop_id = %shop_id, count = withdrawn.len(), amount_cents, "Escrow funds withdrawn");
        Ok(withdrawn)
    }

    async fn transition<F>(&self, shop_id: &str, id: &str, step: F) -> DbResult<Escrow>
    where
        F: FnOnce(&mut Escrow, DateTime<Utc>) -> CoreResult<()>,
    {
        let mut escrow = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Escrow", id))?;

        let from = escrow.state;
        step(&mut escrow, Utc::now())?;

        let mut conn = self.pool.acquire().await?;
        persist(&mut conn, &escrow, from).await?;

        info!(
            reference = %escrow.reference,
            from = %from,
            to = %escrow.state,
            "Escrow transition"
        );
        Ok(escrow)
    }
}

// =============================================================================
// Shared with the sale repository
// =============================================================================

/// Opens an escrow for a fully paid sale with the shop's next reference.
///
/// The sequence continues from the highest reference issued, so references
/// freed by cancelled sales are never handed out again.
pub(crate) async fn open_escrow(
    conn: &mut SqliteConnection,
    shop_id: &str,
    sale_id: &str,
    amount_cents: i64,
    at: DateTime<Utc>,
) -> DbResult<Escrow> {
    let last: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(CAST(SUBSTR(reference, 4) AS INTEGER)), 0) FROM escrows WHERE shop_id = ?1",
    )
    .bind(shop_id)
    .fetch_one(&mut *conn)
    .await?;

    let escrow = Escrow {
        id: new_id(),
        shop_id: shop_id.to_string(),
        sale_id: sale_id.to_string(),
        reference: escrow_reference(last + 1),
        amount_cents,
        state: EscrowState::AwaitingDelivery,
        created_at: at,
        updated_at: at,
        released_at: None,
        completed_at: None,
    };

    debug!(reference = %escrow.reference, sale_id = %sale_id, "Opening escrow");

    sqlx::query(
        r#"
        INSERT INTO escrows (
            id, shop_id, sale_id, reference, amount_cents, state,
            created_at, updated_at, released_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&escrow.id)
    .bind(&escrow.shop_id)
    .bind(&escrow.sale_id)
    .bind(&escrow.reference)
    .bind(escrow.amount_cents)
    .bind(escrow.state)
    .bind(escrow.created_at)
    .bind(escrow.updated_at)
    .bind(escrow.released_at)
    .bind(escrow.completed_at)
    .execute(&mut *conn)
    .await?;

    Ok(escrow)
}

pub(crate) async fn escrow_for_sale(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Option<Escrow>> {
    let escrow = sqlx::query_as::<_, Escrow>("SELECT * FROM escrows WHERE sale_id = ?1")
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(escrow)
}

async fn persist(conn: &mut SqliteConnection, escrow: &Escrow, from: EscrowState) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE escrows
        SET state = ?3, updated_at = ?4, released_at = ?5, completed_at = ?6
        WHERE id = ?1 AND state = ?2
        "#,
    )
    .bind(&escrow.id)
    .bind(from)
    .bind(escrow.state)
    .bind(escrow.updated_at)
    .bind(escrow.released_at)
    .bind(escrow.completed_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict(format!(
            "Escrow {} changed state concurrently",
            escrow.reference
        )));
    }
    Ok(())
}
