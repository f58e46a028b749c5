//! # Catalog Repositories
//!
//! Categories and suppliers of a shop. Products live in
//! [`super::product`] because their stock fields are maintained by the
//! inventory repository.

use chrono::Utc;
use nanotrade_core::{new_id, Category, CategoryInput, Supplier, SupplierInput};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE shop_id = ?1 ORDER BY name COLLATE NOCASE",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    /// Creates a category. `image` is the stored media path, if one was
    /// uploaded.
    ///
    /// ## Errors
    /// `UniqueViolation` when the shop already has a category of that name.
    pub async fn create(
        &self,
        shop_id: &str,
        input: &CategoryInput,
        image: Option<String>,
    ) -> DbResult<Category> {
        let now = Utc::now();
        let category = Category {
            id: new_id(),
            shop_id: shop_id.to_string(),
            name: input.name.trim().to_string(),
            description: input.description.clone(),
            image,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.id, name = %category.name, "Creating category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, shop_id, name, description, image, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.shop_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.image)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(category.name.clone()))?;

        Ok(category)
    }

    /// Updates name and description. A `None` image keeps the current one.
    pub async fn update(
        &self,
        shop_id: &str,
        id: &str,
        input: &CategoryInput,
        image: Option<String>,
    ) -> DbResult<Category> {
        let mut category = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))?;

        category.name = input.name.trim().to_string();
        category.description = input.description.clone();
        if image.is_some() {
            category.image = image;
        }
        category.updated_at = Utc::now();

        debug!(id = %id, "Updating category");

        sqlx::query(
            r#"
            UPDATE categories SET name = ?3, description = ?4, image = ?5, updated_at = ?6
            WHERE id = ?1 AND shop_id = ?2
            "#,
        )
        .bind(&category.id)
        .bind(&category.shop_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.image)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(category.name.clone()))?;

        Ok(category)
    }

    /// Deletes a category; its products become uncategorised.
    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }
        Ok(())
    }
}

// =============================================================================
// Suppliers
// =============================================================================

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers WHERE shop_id = ?1 ORDER BY name COLLATE NOCASE",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers WHERE id = ?1 AND shop_id = ?2",
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(supplier)
    }

    pub async fn create(&self, shop_id: &str, input: &SupplierInput) -> DbResult<Supplier> {
        let now = Utc::now();
        let supplier = Supplier {
            id: new_id(),
            shop_id: shop_id.to_string(),
            name: input.name.trim().to_string(),
            contact_info: input.contact_info.clone(),
            email: input.email.trim().to_lowercase(),
            phone: input.phone.clone(),
            address: input.address.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %supplier.id, name = %supplier.name, "Creating supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                id, shop_id, name, contact_info, email, phone, address, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.shop_id)
        .bind(&supplier.name)
        .bind(&supplier.contact_info)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn update(&self, shop_id: &str, id: &str, input: &SupplierInput) -> DbResult<Supplier> {
        let existing = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))?;

        let supplier = Supplier {
            name: input.name.trim().to_string(),
            contact_info: input.contact_info.clone(),
            email: input.email.trim().to_lowercase(),
            phone: input.phone.clone(),
            address: input.address.clone(),
            updated_at: Utc::now(),
            ..existing
        };

        debug!(id = %id, "Updating supplier");

        sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?3, contact_info = ?4, email = ?5, phone = ?6, address = ?7, updated_at = ?8
            WHERE id = ?1 AND shop_id = ?2
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.shop_id)
        .bind(&supplier.name)
        .bind(&supplier.contact_info)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Deletes a supplier. Movements that referenced it keep their history
    /// with the supplier cleared.
    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        Ok(())
    }
}
