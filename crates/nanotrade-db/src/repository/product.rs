//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Derived Stock Fields
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.quantity / products.status are NEVER written from input.      │
//! │                                                                         │
//! │  create()          → quantity 0, status out_of_stock                    │
//! │  update()          → refresh_stock() in the update's transaction        │
//! │  stock movement    → refresh_stock() in the movement's transaction      │
//! │                      quantity = Σ inventory.quantity                    │
//! │                      status   = StockStatus::derive(quantity, reorder)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use nanotrade_core::{
    new_id, Product, ProductInput, StockStatus, DEFAULT_REORDER_LEVEL,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::begin_write;

const DEFAULT_UNIT_TYPE: &str = "piece";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products of a shop, by name.
    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE shop_id = ?1 ORDER BY name COLLATE NOCASE",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(shop_id = %shop_id, count = products.len(), "Listed products");
        Ok(products)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    pub async fn get_by_sku(&self, shop_id: &str, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE shop_id = ?1 AND sku = ?2",
        )
        .bind(shop_id)
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    /// Products at or below their reorder level, emptiest first.
    pub async fn low_stock(&self, shop_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE shop_id = ?1 AND status IN ('low_stock', 'out_of_stock')
            ORDER BY quantity, name COLLATE NOCASE
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Creates a product with no stock.
    ///
    /// ## Arguments
    /// * `sku` - the input's SKU, or one generated by the caller
    /// * `image` - stored media path of an uploaded image
    ///
    /// ## Errors
    /// - `UniqueViolation` if the SKU is taken in this shop
    /// - `NotFound` if `category_id` is not a category of this shop
    pub async fn create(
        &self,
        shop_id: &str,
        input: &ProductInput,
        sku: &str,
        image: Option<String>,
    ) -> DbResult<Product> {
        let mut tx = begin_write(&self.pool).await?;
        let product = insert_product(&mut tx, shop_id, input, sku, image).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Creates the same product in several shops, all or nothing.
    ///
    /// Every shop is checked (category, free SKU) before the first insert,
    /// and the inserts share one transaction.
    ///
    /// ## Errors
    /// Same as [`create`](Self::create), for the first shop that fails.
    pub async fn create_in_shops(
        &self,
        shop_ids: &[String],
        input: &ProductInput,
        sku: &str,
        image: Option<String>,
    ) -> DbResult<Vec<Product>> {
        let sku = sku.trim();
        let mut tx = begin_write(&self.pool).await?;

        for shop_id in shop_ids {
            if let Some(category_id) = &input.category_id {
                ensure_category(&mut tx, shop_id, category_id).await?;
            }
            let taken: Option<i64> =
                sqlx::query_scalar("SELECT 1 FROM products WHERE shop_id = ?1 AND sku = ?2")
                    .bind(shop_id)
                    .bind(sku)
                    .fetch_optional(&mut *tx)
                    .await?;
            if taken.is_some() {
                return Err(DbError::UniqueViolation {
                    field: "sku".to_string(),
                    value: sku.to_string(),
                });
            }
        }

        let mut created = Vec::with_capacity(shop_ids.len());
        for shop_id in shop_ids {
            created.push(insert_product(&mut tx, shop_id, input, sku, image.clone()).await?);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Updates the editable fields of a product.
    ///
    /// Absent SKU, reorder level, unit type and image keep their current
    /// values. Stock is untouched; quantity and status are re-derived from
    /// the inventory rows inside the same write transaction, so a movement
    /// committed meanwhile is never overwritten.
    pub async fn update(
        &self,
        shop_id: &str,
        id: &str,
        input: &ProductInput,
        image: Option<String>,
    ) -> DbResult<Product> {
        let mut tx = begin_write(&self.pool).await?;

        let existing = find_in_shop(&mut tx, shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if let Some(category_id) = &input.category_id {
            ensure_category(&mut tx, shop_id, category_id).await?;
        }

        let sku = input
            .sku
            .as_deref()
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| existing.sku.clone());

        debug!(id = %id, sku = %sku, "Updating product");

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?3, sku = ?4, price_cents = ?5, purchase_price_cents = ?6,
                description = ?7, category_id = ?8, reorder_level = ?9,
                unit_type = ?10, image = ?11, updated_at = ?12
            WHERE id = ?1 AND shop_id = ?2
            "#,
        )
        .bind(&existing.id)
        .bind(shop_id)
        .bind(input.name.trim())
        .bind(&sku)
        .bind(input.price_cents)
        .bind(input.purchase_price_cents)
        .bind(&input.description)
        .bind(&input.category_id)
        .bind(input.reorder_level.unwrap_or(existing.reorder_level))
        .bind(input.unit_type.as_deref().unwrap_or(&existing.unit_type))
        .bind(image.or_else(|| existing.image.clone()))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(sku.clone()))?;

        refresh_stock(&mut tx, &existing.id).await?;
        let product = find_in_shop(&mut tx, shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        tx.commit().await?;
        Ok(product)
    }

    /// Deletes a product and its inventory rows.
    ///
    /// ## Errors
    /// `ForeignKeyViolation` if the product appears on a sale or an order.
    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    pub async fn count(&self, shop_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE shop_id = ?1")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn find_in_shop(
    conn: &mut SqliteConnection,
    shop_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?1 AND shop_id = ?2")
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(product)
}

async fn ensure_category(conn: &mut SqliteConnection, shop_id: &str, category_id: &str) -> DbResult<()> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1 AND shop_id = ?2")
            .bind(category_id)
            .bind(shop_id)
            .fetch_optional(&mut *conn)
            .await?;
    found
        .map(|_| ())
        .ok_or_else(|| DbError::not_found("Category", category_id))
}

async fn insert_product(
    conn: &mut SqliteConnection,
    shop_id: &str,
    input: &ProductInput,
    sku: &str,
    image: Option<String>,
) -> DbResult<Product> {
    if let Some(category_id) = &input.category_id {
        ensure_category(conn, shop_id, category_id).await?;
    }

    let now = Utc::now();
    let product = Product {
        id: new_id(),
        shop_id: shop_id.to_string(),
        name: input.name.trim().to_string(),
        sku: sku.trim().to_string(),
        price_cents: input.price_cents,
        purchase_price_cents: input.purchase_price_cents,
        quantity: 0,
        description: input.description.clone(),
        category_id: input.category_id.clone(),
        status: StockStatus::OutOfStock,
        reorder_level: input.reorder_level.unwrap_or(DEFAULT_REORDER_LEVEL),
        unit_type: input
            .unit_type
            .clone()
            .unwrap_or_else(|| DEFAULT_UNIT_TYPE.to_string()),
        image,
        created_at: now,
        updated_at: now,
    };

    debug!(id = %product.id, sku = %product.sku, shop_id = %shop_id, "Creating product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, shop_id, name, sku, price_cents, purchase_price_cents, quantity,
            description, category_id, status, reorder_level, unit_type, image,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&product.id)
    .bind(&product.shop_id)
    .bind(&product.name)
    .bind(&product.sku)
    .bind(product.price_cents)
    .bind(product.purchase_price_cents)
    .bind(product.quantity)
    .bind(&product.description)
    .bind(&product.category_id)
    .bind(product.status)
    .bind(product.reorder_level)
    .bind(&product.unit_type)
    .bind(&product.image)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).with_duplicate_value(product.sku.clone()))?;

    Ok(product)
}

/// Recomputes a product's quantity and status from its inventory rows.
///
/// Runs on the caller's connection so it joins the caller's transaction.
pub(crate) async fn refresh_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> DbResult<(i64, StockStatus)> {
    let (reorder_level, total): (i64, i64) = sqlx::query_as(
        r#"
        SELECT p.reorder_level,
               COALESCE((SELECT SUM(i.quantity) FROM inventory i WHERE i.product_id = p.id), 0)
        FROM products p
        WHERE p.id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Product", product_id))?;

    let status = StockStatus::derive(total, reorder_level);

    sqlx::query("UPDATE products SET quantity = ?2, status = ?3, updated_at = ?4 WHERE id = ?1")
        .bind(product_id)
        .bind(total)
        .bind(status)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    debug!(product_id = %product_id, quantity = total, status = status.as_str(), "Refreshed product stock");
    Ok((total, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{
        inventory_input, product_input, setup_shop, shop_input, test_db,
    };

    #[tokio::test]
    async fn test_new_product_has_no_stock() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;

        let product = db
            .products()
            .create(&fx.shop.id, &product_input("Rice 25kg", 1_500_000), "RICE-25KG", None)
            .await
            .unwrap();

        assert_eq!(product.quantity, 0);
        assert_eq!(product.status, StockStatus::OutOfStock);
        assert_eq!(product.reorder_level, DEFAULT_REORDER_LEVEL);
        assert_eq!(product.unit_type, "piece");

        let found = db
            .products()
            .get_by_sku(&fx.shop.id, "RICE-25KG")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, product.id);
        assert_eq!(db.products().low_stock(&fx.shop.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sku_is_unique_per_shop() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let input = product_input("Rice 25kg", 1_500_000);

        db.products()
            .create(&fx.shop.id, &input, "RICE-25KG", None)
            .await
            .unwrap();
        let err = db
            .products()
            .create(&fx.shop.id, &input, "RICE-25KG", None)
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "RICE-25KG");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_category_must_belong_to_shop() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let mut input = product_input("Rice 25kg", 1_500_000);
        input.category_id = Some(new_id());

        let err = db
            .products()
            .create(&fx.shop.id, &input, "RICE-25KG", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_sku_and_image_when_absent() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let product = db
            .products()
            .create(
                &fx.shop.id,
                &product_input("Rice 25kg", 1_500_000),
                "RICE-25KG",
                Some("media/rice.jpg".to_string()),
            )
            .await
            .unwrap();

        let mut input = product_input("Rice 25kg (Thai)", 1_600_000);
        input.sku = None;
        let updated = db
            .products()
            .update(&fx.shop.id, &product.id, &input, None)
            .await
            .unwrap();

        assert_eq!(updated.sku, "RICE-25KG");
        assert_eq!(updated.price_cents, 1_600_000);
        assert_eq!(updated.image.as_deref(), Some("media/rice.jpg"));
        assert_eq!(updated.quantity, 0);
    }

    #[tokio::test]
    async fn test_update_derives_status_from_current_stock() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let product = db
            .products()
            .create(&fx.shop.id, &product_input("Rice 25kg", 1_500_000), "RICE-25KG", None)
            .await
            .unwrap();

        // Stock arrives after the caller last read the product.
        db.inventory()
            .create(
                &fx.shop.id,
                &inventory_input(&product.id, &fx.warehouse.id, 50),
                &fx.owner.id,
            )
            .await
            .unwrap();

        let mut input = product_input("Rice 25kg", 1_600_000);
        input.reorder_level = Some(5);
        let updated = db
            .products()
            .update(&fx.shop.id, &product.id, &input, None)
            .await
            .unwrap();

        assert_eq!(updated.quantity, 50);
        assert_eq!(updated.status, StockStatus::InStock);
        assert_eq!(updated.reorder_level, 5);
    }

    #[tokio::test]
    async fn test_create_in_shops_is_all_or_nothing() {
        let db = test_db().await;
        let fx = setup_shop(&db).await;
        let second = db
            .shops()
            .create(&fx.owner.id, &fx.business.id, &shop_input("Bonamoussadi Branch"))
            .await
            .unwrap();
        let input = product_input("Rice 25kg", 1_500_000);

        // The SKU already exists in the second shop only.
        db.products()
            .create(&second.id, &input, "RICE-25KG", None)
            .await
            .unwrap();

        let targets = vec![fx.shop.id.clone(), second.id.clone()];
        let err = db
            .products()
            .create_in_shops(&targets, &input, "RICE-25KG", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(db.products().count(&fx.shop.id).await.unwrap(), 0);

        let third = db
            .shops()
            .create(&fx.owner.id, &fx.business.id, &shop_input("Bonapriso Branch"))
            .await
            .unwrap();
        let targets = vec![fx.shop.id.clone(), third.id.clone()];
        let created = db
            .products()
            .create_in_shops(&targets, &input, "RICE-25KG", None)
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(db.products().count(&fx.shop.id).await.unwrap(), 1);
        assert_eq!(db.products().count(&third.id).await.unwrap(), 1);
    }
}
