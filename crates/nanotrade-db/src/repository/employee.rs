//! # Employee Repository

use chrono::Utc;
use nanotrade_core::{new_id, Employee, EmployeeInput};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    pub async fn list_by_shop(&self, shop_id: &str) -> DbResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE shop_id = ?1 ORDER BY hire_date, created_at",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }

    /// Employs an existing user at the shop.
    ///
    /// ## Errors
    /// - `ForeignKeyViolation` if the user does not exist
    /// - `UniqueViolation` on `national_id`, or if the user already works here
    pub async fn create(&self, shop_id: &str, input: &EmployeeInput) -> DbResult<Employee> {
        let now = Utc::now();
        let employee = Employee {
            id: new_id(),
            user_id: input.user_id.clone(),
            shop_id: shop_id.to_string(),
            national_id: input.national_id.trim().to_string(),
            date_of_birth: input.date_of_birth,
            hire_date: input.hire_date,
            employment_status: input.employment_status,
            emergency_contact: input.emergency_contact.clone(),
            education: input.education.clone(),
            salary_cents: input.salary_cents,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %employee.id, shop_id = %shop_id, user_id = %employee.user_id, "Creating employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, user_id, shop_id, national_id, date_of_birth, hire_date,
                employment_status, emergency_contact, education, salary_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.user_id)
        .bind(&employee.shop_id)
        .bind(&employee.national_id)
        .bind(employee.date_of_birth)
        .bind(employee.hire_date)
        .bind(employee.employment_status)
        .bind(Json(&employee.emergency_contact))
        .bind(Json(&employee.education))
        .bind(employee.salary_cents)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(employee.national_id.clone()))?;

        Ok(employee)
    }

    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?1 AND shop_id = ?2")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }
        Ok(())
    }
}
