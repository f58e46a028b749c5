//! # Inventory Repository
//!
//! Per-warehouse stock and the movement log.
//!
//! ## Recording a Movement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  UPDATE inventory SET quantity = quantity + Δ                           │
//! │   WHERE id = ? AND quantity + Δ >= 0                                    │
//! │     AND (Δ <= 0 OR maximum IS NULL OR quantity + Δ <= maximum)          │
//! │    │                                                                    │
//! │    ├── 0 rows → reload row, StockLevel::apply() names the violation     │
//! │    │            (InsufficientStock / AboveMaximumStock), ROLLBACK       │
//! │    ▼                                                                    │
//! │  INSERT INTO stock_movements (..., quantity = Δ, quantity_after)        │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  refresh_stock(product)  → products.quantity / products.status          │
//! │    │                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The check and the write are one statement, so two concurrent sales of
//! the last unit cannot both succeed.

use chrono::Utc;
use nanotrade_core::stock::reorder_suggestion;
use nanotrade_core::{
    new_id, CoreError, Inventory, InventoryInput, InventoryLine, InventoryUpdate, MovementInput,
    MovementType, ReorderSuggestion, StockMovement,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use crate::repository::product::refresh_stock;

const OPENING_STOCK_REASON: &str = "Opening stock";

/// A stock change to record against one inventory row.
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub movement_type: MovementType,
    /// As entered; [`MovementType::signed_delta`] turns it into the change.
    pub quantity: i64,
    pub supplier_id: Option<String>,
    pub reason: Option<String>,
    pub performed_by_id: String,
    pub sale_id: Option<String>,
}

impl MovementRequest {
    pub fn from_input(input: &MovementInput, performed_by_id: &str) -> Self {
        MovementRequest {
            movement_type: input.movement_type,
            quantity: input.quantity,
            supplier_id: input.supplier_id.clone(),
            reason: input.reason.clone(),
            performed_by_id: performed_by_id.to_string(),
            sale_id: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Inventory rows of a shop with product and warehouse names.
    pub async fn list_lines(&self, shop_id: &str) -> DbResult<Vec<InventoryLine>> {
        let lines = sqlx::query_as::<_, InventoryLine>(
            r#"
            SELECT i.id, i.product_id, p.name AS product_name, p.sku,
                   i.warehouse_id, w.name AS warehouse_name, i.quantity,
                   i.minimum_stock_level, i.maximum_stock_level, p.reorder_level,
                   i.batch_number, i.expiration_date, i.last_updated
            FROM inventory i
            JOIN products p ON p.id = i.product_id
            JOIN warehouses w ON w.id = i.warehouse_id
            WHERE w.shop_id = ?1
            ORDER BY p.name COLLATE NOCASE, w.name COLLATE NOCASE
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Inventory>> {
        let mut conn = self.pool.acquire().await?;
        find_in_shop(&mut conn, shop_id, id).await
    }

    /// Stock rows of one product, fullest first.
    pub async fn for_product(&self, shop_id: &str, product_id: &str) -> DbResult<Vec<Inventory>> {
        let mut conn = self.pool.acquire().await?;
        stock_rows(&mut conn, shop_id, product_id).await
    }

    /// Creates the inventory row of a product in a warehouse.
    ///
    /// A positive opening quantity is booked as an `added` movement, so the
    /// movement log always explains the current quantity.
    ///
    /// ## Errors
    /// - `NotFound` if the product, warehouse or supplier is not in the shop
    /// - `UniqueViolation` if the product already has a row in the warehouse
    pub async fn create(
        &self,
        shop_id: &str,
        input: &InventoryInput,
        performed_by_id: &str,
    ) -> DbResult<Inventory> {
        let mut tx = begin_write(&self.pool).await?;

        let sku = product_sku(&mut tx, shop_id, &input.product_id).await?;
        ensure_warehouse(&mut tx, shop_id, &input.warehouse_id).await?;
        if let Some(supplier_id) = &input.supplier_id {
            ensure_supplier(&mut tx, shop_id, supplier_id).await?;
        }

        let now = Utc::now();
        let inventory = Inventory {
            id: new_id(),
            product_id: input.product_id.clone(),
            warehouse_id: input.warehouse_id.clone(),
            quantity: 0,
            last_updated: now,
            minimum_stock_level: input.minimum_stock_level,
            maximum_stock_level: input.maximum_stock_level,
            batch_number: input.batch_number.clone(),
            expiration_date: input.expiration_date,
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %inventory.id, sku = %sku, warehouse_id = %inventory.warehouse_id, "Creating inventory");

        sqlx::query(
            r#"
            INSERT INTO inventory (
                id, product_id, warehouse_id, quantity, last_updated,
                minimum_stock_level, maximum_stock_level, batch_number,
                expiration_date, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&inventory.id)
        .bind(&inventory.product_id)
        .bind(&inventory.warehouse_id)
        .bind(inventory.quantity)
        .bind(inventory.last_updated)
        .bind(inventory.minimum_stock_level)
        .bind(inventory.maximum_stock_level)
        .bind(&inventory.batch_number)
        .bind(inventory.expiration_date)
        .bind(&inventory.notes)
        .bind(inventory.created_at)
        .bind(inventory.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(sku.clone()))?;

        if input.quantity > 0 {
            let opening = MovementRequest {
                movement_type: MovementType::Added,
                quantity: input.quantity,
                supplier_id: input.supplier_id.clone(),
                reason: Some(OPENING_STOCK_REASON.to_string()),
                performed_by_id: performed_by_id.to_string(),
                sale_id: None,
            };
            apply_movement(&mut tx, &inventory, &sku, &opening).await?;
        }

        let created = find_in_shop(&mut tx, shop_id, &inventory.id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", &inventory.id))?;

        tx.commit().await?;
        Ok(created)
    }

    /// Updates bounds, batch and notes. Quantity only changes through
    /// movements.
    ///
    /// ## Errors
    /// `Rule(AboveMaximumStock)` if the new maximum is below the current
    /// quantity.
    pub async fn update(&self, shop_id: &str, id: &str, update: &InventoryUpdate) -> DbResult<Inventory> {
        let mut tx = begin_write(&self.pool).await?;

        let existing = find_in_shop(&mut tx, shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", id))?;

        if let Some(maximum) = update.maximum_stock_level {
            if existing.quantity > maximum {
                let sku = product_sku(&mut tx, shop_id, &existing.product_id).await?;
                return Err(CoreError::AboveMaximumStock {
                    sku,
                    resulting: existing.quantity,
                    maximum,
                }
                .into());
            }
        }

        debug!(id = %id, "Updating inventory");

        sqlx::query(
            r#"
            UPDATE inventory SET
                minimum_stock_level = ?2, maximum_stock_level = ?3, batch_number = ?4,
                expiration_date = ?5, notes = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.minimum_stock_level)
        .bind(update.maximum_stock_level)
        .bind(&update.batch_number)
        .bind(update.expiration_date)
        .bind(&update.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let updated = find_in_shop(&mut tx, shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", id))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes an empty inventory row.
    ///
    /// ## Errors
    /// `Conflict` while the row holds stock; adjust it to zero first so the
    /// movement log records where the units went.
    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let existing = find_in_shop(&mut tx, shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", id))?;

        if existing.quantity > 0 {
            return Err(DbError::conflict(format!(
                "Inventory {id} still holds {} units; adjust it to zero first",
                existing.quantity
            )));
        }

        sqlx::query("DELETE FROM inventory WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        refresh_stock(&mut tx, &existing.product_id).await?;

        tx.commit().await?;

        debug!(id = %id, "Deleted inventory");
        Ok(())
    }

    /// Records a movement against an inventory row of the shop.
    pub async fn record_movement(
        &self,
        shop_id: &str,
        inventory_id: &str,
        request: &MovementRequest,
    ) -> DbResult<StockMovement> {
        let mut tx = begin_write(&self.pool).await?;

        let inventory = find_in_shop(&mut tx, shop_id, inventory_id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", inventory_id))?;
        if let Some(supplier_id) = &request.supplier_id {
            ensure_supplier(&mut tx, shop_id, supplier_id).await?;
        }
        let sku = product_sku(&mut tx, shop_id, &inventory.product_id).await?;

        let movement = apply_movement(&mut tx, &inventory, &sku, request).await?;

        tx.commit().await?;

        info!(
            inventory_id = %inventory_id,
            movement_type = movement.movement_type.as_str(),
            delta = movement.quantity,
            quantity_after = movement.quantity_after,
            "Stock movement recorded"
        );
        Ok(movement)
    }

    /// Movement history of an inventory row, newest first.
    pub async fn movements(&self, shop_id: &str, inventory_id: &str) -> DbResult<Vec<StockMovement>> {
        let mut conn = self.pool.acquire().await?;

        find_in_shop(&mut conn, shop_id, inventory_id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", inventory_id))?;

        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE inventory_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(inventory_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(movements)
    }

    /// Rows at or below their threshold with how much to order.
    pub async fn reorder_suggestions(&self, shop_id: &str) -> DbResult<Vec<ReorderSuggestion>> {
        let suggestions = self
            .list_lines(shop_id)
            .await?
            .into_iter()
            .filter_map(|line| {
                let suggested_quantity = reorder_suggestion(
                    line.quantity,
                    line.minimum_stock_level,
                    line.maximum_stock_level,
                    line.reorder_level,
                )?;
                Some(ReorderSuggestion {
                    inventory_id: line.id,
                    product_id: line.product_id,
                    product_name: line.product_name,
                    sku: line.sku,
                    warehouse_id: line.warehouse_id,
                    warehouse_name: line.warehouse_name,
                    quantity: line.quantity,
                    suggested_quantity,
                })
            })
            .collect();
        Ok(suggestions)
    }
}

// =============================================================================
// Shared with the sale repository
// =============================================================================

/// Applies one movement inside the caller's transaction.
pub(crate) async fn apply_movement(
    conn: &mut SqliteConnection,
    inventory: &Inventory,
    sku: &str,
    request: &MovementRequest,
) -> DbResult<StockMovement> {
    let delta = request
        .movement_type
        .signed_delta(request.quantity)
        .map_err(CoreError::from)?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE inventory
        SET quantity = quantity + ?2, last_updated = ?3, updated_at = ?3
        WHERE id = ?1
          AND quantity + ?2 >= 0
          AND (?2 <= 0 OR maximum_stock_level IS NULL OR quantity + ?2 <= maximum_stock_level)
        "#,
    )
    .bind(&inventory.id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current = sqlx::query_as::<_, Inventory>("SELECT * FROM inventory WHERE id = ?1")
            .bind(&inventory.id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", &inventory.id))?;

        warn!(
            inventory_id = %inventory.id,
            sku = %sku,
            quantity = current.quantity,
            delta,
            "Stock movement refused"
        );

        return match current
            .level()
            .apply(sku, request.movement_type, request.quantity)
        {
            Err(rule) => Err(rule.into()),
            Ok(_) => Err(DbError::TransactionFailed(format!(
                "Stock of {sku} changed while recording the movement"
            ))),
        };
    }

    let quantity_after: i64 = sqlx::query_scalar("SELECT quantity FROM inventory WHERE id = ?1")
        .bind(&inventory.id)
        .fetch_one(&mut *conn)
        .await?;

    let movement = StockMovement {
        id: new_id(),
        product_id: inventory.product_id.clone(),
        inventory_id: inventory.id.clone(),
        warehouse_id: inventory.warehouse_id.clone(),
        movement_type: request.movement_type,
        quantity: delta,
        quantity_after,
        supplier_id: request.supplier_id.clone(),
        reason: request.reason.clone(),
        performed_by_id: request.performed_by_id.clone(),
        sale_id: request.sale_id.clone(),
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, product_id, inventory_id, warehouse_id, movement_type, quantity,
            quantity_after, supplier_id, reason, performed_by_id, sale_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.inventory_id)
    .bind(&movement.warehouse_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.quantity_after)
    .bind(&movement.supplier_id)
    .bind(&movement.reason)
    .bind(&movement.performed_by_id)
    .bind(&movement.sale_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    refresh_stock(conn, &inventory.product_id).await?;

    Ok(movement)
}

/// The row of a product in one warehouse of the shop.
pub(crate) async fn find_for_product(
    conn: &mut SqliteConnection,
    shop_id: &str,
    product_id: &str,
    warehouse_id: &str,
) -> DbResult<Option<Inventory>> {
    let row = sqlx::query_as::<_, Inventory>(
        r#"
        SELECT i.* FROM inventory i
        JOIN warehouses w ON w.id = i.warehouse_id
        WHERE i.product_id = ?1 AND i.warehouse_id = ?2 AND w.shop_id = ?3
        "#,
    )
    .bind(product_id)
    .bind(warehouse_id)
    .bind(shop_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Every stock row of a product in the shop, fullest first.
pub(crate) async fn stock_rows(
    conn: &mut SqliteConnection,
    shop_id: &str,
    product_id: &str,
) -> DbResult<Vec<Inventory>> {
    let rows = sqlx::query_as::<_, Inventory>(
        r#"
        SELECT i.* FROM inventory i
        JOIN warehouses w ON w.id = i.warehouse_id
        WHERE i.product_id = ?1 AND w.shop_id = ?2
        ORDER BY i.quantity DESC, i.created_at
        "#,
    )
    .bind(product_id)
    .bind(shop_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

async fn find_in_shop(
    conn: &mut SqliteConnection,
    shop_id: &str,
    id: &str,
) -> DbResult<Option<Inventory>> {
    let inventory = sqlx::query_as::<_, Inventory>(
        r#"
        SELECT i.* FROM inventory i
        JOIN warehouses w ON w.id = i.warehouse_id
        WHERE i.id = ?1 AND w.shop_id = ?2
        "#,
    )
    .bind(id)
    .bind(shop_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(inventory)
}

pub(crate) async fn product_sku(
    conn: &mut SqliteConnection,
    shop_id: &str,
    product_id: &str,
) -> DbResult<String> {
    sqlx::query_scalar("SELECT sku FROM products WHERE id = ?1 AND shop_id = ?2")
        .bind(product_id)
        .bind(shop_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))
}

async fn ensure_warehouse(conn: &mut SqliteConnection, shop_id: &str, id: &str) -> DbResult<()> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM warehouses WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&mut *conn)
            .await?;
    found.map(|_| ()).ok_or_else(|| DbError::not_found("Warehouse", id))
}

async fn ensure_supplier(conn: &mut SqliteConnection, shop_id: &str, id: &str) -> DbResult<()> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM suppliers WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&mut *conn)
            .await?;
    found.map(|_| ()).ok_or_else(|| DbError::not_found("Supplier", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{
        inventory_input, product_input, setup_shop, stock_product, test_db, warehouse_input,
    };
    use nanotrade_core::StockStatus;

    fn movement(movement_type: MovementType, quantity: i64, by: &str) -> MovementRequest {
        MovementRequest {
            movement_type,
            quantity,
            supplier_id: None,
            reason: Some("count".to_string()),
            performed_by_id: by.to_string(),
            sale_id: None,
        }
    }

    #[tokio::test]
    async fn test_opening_quantity_is_a_movement() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, inventory) = stock_product(&db, &fx, "OIL-5L", 25).await;

        assert_eq!(inventory.quantity, 25);

        let movements = db.inventory().movements(&fx.shop.id, &inventory.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Added);
        assert_eq!(movements[0].quantity, 25);
        assert_eq!(movements[0].quantity_after, 25);

        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 25);
        assert_eq!(product.status, StockStatus::InStock);
    }

    #[tokio::test]
    async fn test_product_quantity_is_sum_of_warehouses() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, _) = stock_product(&db, &fx, "OIL-5L", 6).await;
        let second = db
            .warehouses()
            .create(&fx.shop.id, &warehouse_input("Yaoundé"))
            .await
            .unwrap();

        let mut input = inventory_input(&product.id, &second.id, 3);
        input.minimum_stock_level = 1;
        db.inventory()
            .create(&fx.shop.id, &input, &fx.owner.id)
            .await
            .unwrap();

        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 9);
        // reorder level 10
        assert_eq!(product.status, StockStatus::LowStock);
    }

    #[tokio::test]
    async fn test_sale_movement_cannot_go_negative() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, inventory) = stock_product(&db, &fx, "OIL-5L", 3).await;

        let err = db
            .inventory()
            .record_movement(
                &fx.shop.id,
                &inventory.id,
                &movement(MovementType::Sold, 5, &fx.owner.id),
            )
            .await
            .unwrap_err();

        match err {
            DbError::Rule(CoreError::InsufficientStock {
                sku,
                available,
                requested,
            }) => {
                assert_eq!(sku, "OIL-5L");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 3);
        assert_eq!(
            db.inventory().movements(&fx.shop.id, &inventory.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_maximum_only_limits_increases() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let product = db
            .products()
            .create(&fx.shop.id, &product_input("Sugar 1kg", 90_000), "SUGAR-1KG", None)
            .await
            .unwrap();
        let mut input = inventory_input(&product.id, &fx.warehouse.id, 8);
        input.maximum_stock_level = Some(10);
        let inventory = db
            .inventory()
            .create(&fx.shop.id, &input, &fx.owner.id)
            .await
            .unwrap();

        let err = db
            .inventory()
            .record_movement(
                &fx.shop.id,
                &inventory.id,
                &movement(MovementType::Added, 3, &fx.owner.id),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::AboveMaximumStock {
                resulting: 11,
                maximum: 10,
                ..
            })
        ));

        let adjusted = db
            .inventory()
            .record_movement(
                &fx.shop.id,
                &inventory.id,
                &movement(MovementType::Adjustment, -2, &fx.owner.id),
            )
            .await
            .unwrap();
        assert_eq!(adjusted.quantity, -2);
        assert_eq!(adjusted.quantity_after, 6);
    }

    #[tokio::test]
    async fn test_lowering_maximum_below_stock_is_refused() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (_, inventory) = stock_product(&db, &fx, "OIL-5L", 20).await;

        let update = InventoryUpdate {
            maximum_stock_level: Some(15),
            ..Default::default()
        };
        let err = db
            .inventory()
            .update(&fx.shop.id, &inventory.id, &update)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::AboveMaximumStock { .. })));
    }

    #[tokio::test]
    async fn test_stocked_row_cannot_be_deleted() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let (product, inventory) = stock_product(&db, &fx, "OIL-5L", 2).await;

        let err = db.inventory().delete(&fx.shop.id, &inventory.id).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        db.inventory()
            .record_movement(
                &fx.shop.id,
                &inventory.id,
                &movement(MovementType::Adjustment, -2, &fx.owner.id),
            )
            .await
            .unwrap();
        db.inventory().delete(&fx.shop.id, &inventory.id).await.unwrap();

        let product = db.products().get(&fx.shop.id, &product.id).await.unwrap().unwrap();
        assert_eq!(product.quantity, 0);
        assert_eq!(product.status, StockStatus::OutOfStock);
    }

    #[tokio::test]
    async fn test_reorder_suggestions() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        stock_product(&db, &fx, "OIL-5L", 4).await;
        stock_product(&db, &fx, "RICE-25KG", 40).await;

        let suggestions = db.inventory().reorder_suggestions(&fx.shop.id).await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].sku, "OIL-5L");
        // threshold = reorder level 10, no maximum: fill to 20
        assert_eq!(suggestions[0].suggested_quantity, 16);
    }

    #[tokio::test]
    async fn test_list_lines_joins_names() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        stock_product(&db, &fx, "OIL-5L", 4).await;

        let lines = db.inventory().list_lines(&fx.shop.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].sku, "OIL-5L");
        assert_eq!(lines[0].warehouse_name, fx.warehouse.name);
        assert_eq!(lines[0].status(), StockStatus::LowStock);
        assert!(db.inventory().list_lines("other-shop").await.unwrap().is_empty());
    }
}
