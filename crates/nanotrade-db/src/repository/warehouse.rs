//! # Warehouse Repository

use chrono::Utc;
use nanotrade_core::{new_id, Warehouse, WarehouseInput};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;
use crate::repository::product::refresh_stock;

#[derive(Debug, Clone)]
pub struct WarehouseRepository {
    pool: SqlitePool,
}

impl WarehouseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WarehouseRepository { pool }
    }

    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Warehouse>> {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            "SELECT * FROM warehouses WHERE shop_id = ?1 ORDER BY name COLLATE NOCASE",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(warehouses)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Warehouse>> {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            "SELECT * FROM warehouses WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(warehouse)
    }

    pub async fn create(&self, shop_id: &str, input: &WarehouseInput) -> DbResult<Warehouse> {
        let now = Utc::now();
        let warehouse = Warehouse {
            id: new_id(),
            shop_id: shop_id.to_string(),
            name: input.name.trim().to_string(),
            region: input.region.trim().to_string(),
            location: input.location.clone(),
            capacity: input.capacity,
            manager: input.manager.clone(),
            description: input.description.clone(),
            status: input.status,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %warehouse.id, name = %warehouse.name, "Creating warehouse");

        sqlx::query(
            r#"
            INSERT INTO warehouses (
                id, shop_id, name, region, location, capacity, manager, description,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.shop_id)
        .bind(&warehouse.name)
        .bind(&warehouse.region)
        .bind(&warehouse.location)
        .bind(warehouse.capacity)
        .bind(&warehouse.manager)
        .bind(&warehouse.description)
        .bind(warehouse.status)
        .bind(warehouse.created_at)
        .bind(warehouse.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(warehouse)
    }

    pub async fn update(&self, shop_id: &str, id: &str, input: &WarehouseInput) -> DbResult<Warehouse> {
        let existing = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Warehouse", id))?;

        let warehouse = Warehouse {
            name: input.name.trim().to_string(),
            region: input.region.trim().to_string(),
            location: input.location.clone(),
            capacity: input.capacity,
            manager: input.manager.clone(),
            description: input.description.clone(),
            status: input.status,
            updated_at: Utc::now(),
            ..existing
        };

        debug!(id = %id, "Updating warehouse");

        sqlx::query(
            r#"
            UPDATE warehouses SET
                name = ?3, region = ?4, location = ?5, capacity = ?6, manager = ?7,
                description = ?8, status = ?9, updated_at = ?10
            WHERE id = ?1 AND shop_id = ?2
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.shop_id)
        .bind(&warehouse.name)
        .bind(&warehouse.region)
        .bind(&warehouse.location)
        .bind(warehouse.capacity)
        .bind(&warehouse.manager)
        .bind(&warehouse.description)
        .bind(warehouse.status)
        .bind(warehouse.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(warehouse)
    }

    /// Deletes an empty warehouse together with its (empty) inventory rows.
    ///
    /// ## Errors
    /// - `Conflict` while any inventory row in it holds stock
    /// - `ForeignKeyViolation` if past sales were fulfilled from it
    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let held: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(i.quantity), 0)
            FROM warehouses w LEFT JOIN inventory i ON i.warehouse_id = w.id
            WHERE w.id = ?1 AND w.shop_id = ?2
            GROUP BY w.id
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?;

        match held {
            None => return Err(DbError::not_found("Warehouse", id)),
            Some(units) if units > 0 => {
                return Err(DbError::conflict(format!(
                    "Warehouse still holds {units} units; move or adjust the stock first"
                )))
            }
            Some(_) => {}
        }

        let product_ids: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT product_id FROM inventory WHERE warehouse_id = ?1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM warehouses WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;

        for product_id in &product_ids {
            refresh_stock(&mut tx, product_id).await?;
        }

        tx.commit().await?;

        info!(id = %id, shop_id = %shop_id, "Warehouse deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{setup_shop, stock_product, test_db, warehouse_input};

    #[tokio::test]
    async fn test_update_warehouse() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;

        let mut input = warehouse_input("Bonaberi Depot");
        input.capacity = Some(5_000);
        let updated = db
            .warehouses()
            .update(&fx.shop.id, &fx.warehouse.id, &input)
            .await
            .unwrap();

        assert_eq!(updated.name, "Bonaberi Depot");
        assert_eq!(updated.capacity, Some(5_000));
        assert_eq!(updated.created_at, fx.warehouse.created_at);
    }

    #[tokio::test]
    async fn test_warehouse_holding_stock_cannot_be_deleted() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        stock_product(&db, &fx, "OIL-5L", 12).await;

        let err = db
            .warehouses()
            .delete(&fx.shop.id, &fx.warehouse.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
        assert!(db
            .warehouses()
            .get(&fx.shop.id, &fx.warehouse.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_empty_warehouse_is_deleted() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let spare = db
            .warehouses()
            .create(&fx.shop.id, &warehouse_input("Spare"))
            .await
            .unwrap();

        db.warehouses().delete(&fx.shop.id, &spare.id).await.unwrap();
        assert_eq!(db.warehouses().list_by_shop(&fx.shop.id).await.unwrap().len(), 1);

        let err = db.warehouses().delete(&fx.shop.id, &spare.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
