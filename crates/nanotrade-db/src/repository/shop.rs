//! # Shop Repository
//!
//! Shops and who may act in them.
//!
//! ## Access
//! ```text
//! user ──owns──────────► shop      (shops.owner_id)
//! user ──employed at───► shop      (employees.user_id / shop_id)
//! ```
//! Either relation grants access; the role decides what the user may do.

use chrono::Utc;
use nanotrade_core::{new_id, Shop, ShopInput};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    /// Shops the user owns or works at, oldest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Shop>> {
        let shops = sqlx::query_as::<_, Shop>(
            r#"
            SELECT * FROM shops
            WHERE owner_id = ?1
               OR id IN (SELECT shop_id FROM employees WHERE user_id = ?1)
            ORDER BY created_at, name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(shops)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(shop)
    }

    /// The shop with `id`, if the user owns it or works there.
    pub async fn get_for_user(&self, id: &str, user_id: &str) -> DbResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>(
            r#"
            SELECT * FROM shops
            WHERE id = ?1
              AND (owner_id = ?2
                   OR id IN (SELECT shop_id FROM employees WHERE user_id = ?2))
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(shop)
    }

    /// The shop a request falls back to when it names none: the user's
    /// first shop.
    pub async fn primary_for_user(&self, user_id: &str) -> DbResult<Option<Shop>> {
        Ok(self.list_for_user(user_id).await?.into_iter().next())
    }

    pub async fn create(&self, owner_id: &str, business_id: &str, input: &ShopInput) -> DbResult<Shop> {
        let now = Utc::now();
        let shop = Shop {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            business_id: business_id.to_string(),
            owner_id: owner_id.to_string(),
            status: input.status,
            location: input.location.clone(),
            contact_info: input.contact_info.clone(),
            operating_hours: input.operating_hours.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %shop.id, name = %shop.name, "Creating shop");

        sqlx::query(
            r#"
            INSERT INTO shops (
                id, name, description, business_id, owner_id, status,
                location, contact_info, operating_hours, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&shop.id)
        .bind(&shop.name)
        .bind(&shop.description)
        .bind(&shop.business_id)
        .bind(&shop.owner_id)
        .bind(shop.status)
        .bind(Json(&shop.location))
        .bind(Json(&shop.contact_info))
        .bind(Json(&shop.operating_hours))
        .bind(shop.created_at)
        .bind(shop.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(shop)
    }

    /// Updates a shop owned by `owner_id`.
    pub async fn update(&self, id: &str, owner_id: &str, input: &ShopInput) -> DbResult<Shop> {
        let now = Utc::now();

        debug!(id = %id, "Updating shop");

        let result = sqlx::query(
            r#"
            UPDATE shops SET
                name = ?3, description = ?4, status = ?5, location = ?6,
                contact_info = ?7, operating_hours = ?8, updated_at = ?9
            WHERE id = ?1 AND owner_id = ?2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.status)
        .bind(Json(&input.location))
        .bind(Json(&input.contact_info))
        .bind(Json(&input.operating_hours))
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Shop", id))
    }

    /// Deletes a shop owned by `owner_id` with everything scoped to it.
    pub async fn delete(&self, id: &str, owner_id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting shop");

        let result = sqlx::query("DELETE FROM shops WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", id));
        }
        Ok(())
    }
}
