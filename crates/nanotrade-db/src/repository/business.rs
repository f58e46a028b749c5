//! # Business Repository
//!
//! The business profile of a shop owner. One per owner.

use chrono::Utc;
use nanotrade_core::{new_id, BusinessInformation, BusinessInput};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    pub async fn get_by_owner(&self, owner_id: &str) -> DbResult<Option<BusinessInformation>> {
        let business = sqlx::query_as::<_, BusinessInformation>(
            "SELECT * FROM business_information WHERE owner_id = ?1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(business)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<BusinessInformation>> {
        let business = sqlx::query_as::<_, BusinessInformation>(
            "SELECT * FROM business_information WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(business)
    }

    /// Registers the owner's business.
    ///
    /// ## Errors
    /// `UniqueViolation` on `owner_id` if the owner already has one.
    pub async fn create(&self, owner_id: &str, input: &BusinessInput) -> DbResult<BusinessInformation> {
        let now = Utc::now();
        let business = from_input(new_id(), owner_id, input, now, now);

        debug!(id = %business.id, owner_id = %owner_id, "Creating business");

        sqlx::query(
            r#"
            INSERT INTO business_information (
                id, owner_id, full_business_name, business_type, address,
                number_of_employees, tax_id_number, shop_logo, taxation_documents,
                national_id_card, contact_info, legal_structure, year_established,
                industry_category, annual_revenue_cents, business_description,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
        )
        .bind(&business.id)
        .bind(&business.owner_id)
        .bind(&business.full_business_name)
        .bind(&business.business_type)
        .bind(Json(&business.address))
        .bind(business.number_of_employees)
        .bind(&business.tax_id_number)
        .bind(&business.shop_logo)
        .bind(&business.taxation_documents)
        .bind(&business.national_id_card)
        .bind(Json(&business.contact_info))
        .bind(&business.legal_structure)
        .bind(business.year_established)
        .bind(&business.industry_category)
        .bind(business.annual_revenue_cents)
        .bind(&business.business_description)
        .bind(business.created_at)
        .bind(business.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(owner_id))?;

        Ok(business)
    }

    /// Replaces the profile. Only the owner's own business can be updated.
    pub async fn update(
        &self,
        id: &str,
        owner_id: &str,
        input: &BusinessInput,
    ) -> DbResult<BusinessInformation> {
        let existing = self
            .get_by_id(id)
            .await?
            .filter(|b| b.owner_id == owner_id)
            .ok_or_else(|| DbError::not_found("Business", id))?;

        let business = from_input(existing.id, owner_id, input, existing.created_at, Utc::now());

        debug!(id = %business.id, "Updating business");

        sqlx::query(
            r#"
            UPDATE business_information SET
                full_business_name = ?2, business_type = ?3, address = ?4,
                number_of_employees = ?5, tax_id_number = ?6, shop_logo = ?7,
                taxation_documents = ?8, national_id_card = ?9, contact_info = ?10,
                legal_structure = ?11, year_established = ?12, industry_category = ?13,
                annual_revenue_cents = ?14, business_description = ?15, updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(&business.id)
        .bind(&business.full_business_name)
        .bind(&business.business_type)
        .bind(Json(&business.address))
        .bind(business.number_of_employees)
        .bind(&business.tax_id_number)
        .bind(&business.shop_logo)
        .bind(&business.taxation_documents)
        .bind(&business.national_id_card)
        .bind(Json(&business.contact_info))
        .bind(&business.legal_structure)
        .bind(business.year_established)
        .bind(&business.industry_category)
        .bind(business.annual_revenue_cents)
        .bind(&business.business_description)
        .bind(business.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(business)
    }
}

fn from_input(
    id: String,
    owner_id: &str,
    input: &BusinessInput,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> BusinessInformation {
    BusinessInformation {
        id,
        owner_id: owner_id.to_string(),
        full_business_name: input.full_business_name.trim().to_string(),
        business_type: input.business_type.clone(),
        address: input.address.clone(),
        number_of_employees: input.number_of_employees,
        tax_id_number: input.tax_id_number.clone(),
        shop_logo: input.shop_logo.clone(),
        taxation_documents: input.taxation_documents.clone(),
        national_id_card: input.national_id_card.clone(),
        contact_info: input.contact_info.clone(),
        legal_structure: input.legal_structure.clone(),
        year_established: input.year_established,
        industry_category: input.industry_category.clone(),
        annual_revenue_cents: input.annual_revenue_cents,
        business_description: input.business_description.clone(),
        created_at,
        updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{business_input, register_request, test_db};

    #[tokio::test]
    async fn test_one_business_per_owner() {
        let db = test_db().await;
        let owner = db
            .users()
            .create(&register_request("amina", "a@shop.cm"), "hash")
            .await
            .unwrap();

        let business = db
            .businesses()
            .create(&owner.id, &business_input("Amina Stores"))
            .await
            .unwrap();
        assert_eq!(business.contact_info.email, "contact@amina.cm");

        let err = db
            .businesses()
            .create(&owner.id, &business_input("Second"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_requires_ownership() {
        let db = test_db().await;
        let owner = db
            .users()
            .create(&register_request("amina", "a@shop.cm"), "hash")
            .await
            .unwrap();
        let business = db
            .businesses()
            .create(&owner.id, &business_input("Amina Stores"))
            .await
            .unwrap();

        let updated = db
            .businesses()
            .update(&business.id, &owner.id, &business_input("Amina & Sons"))
            .await
            .unwrap();
        assert_eq!(updated.full_business_name, "Amina & Sons");
        assert_eq!(updated.created_at, business.created_at);

        let err = db
            .businesses()
            .update(&business.id, "someone-else", &business_input("Hijack"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
