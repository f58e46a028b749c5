//! # User Repository
//!
//! Accounts. Passwords arrive already hashed; this layer never sees a
//! plaintext password.

use chrono::Utc;
use nanotrade_core::{new_id, RecordStatus, RegisterRequest, UpdateProfileRequest, User};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account from a registration request.
    ///
    /// ## Errors
    /// `UniqueViolation` on `username` or `email`.
    pub async fn create(&self, request: &RegisterRequest, password_hash: &str) -> DbResult<User> {
        let now = Utc::now();
        let user = User {
            id: new_id(),
            username: request.username.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            password_hash: password_hash.to_string(),
            is_staff: false,
            role: request.role,
            profile_image: None,
            phone_number: request.phone_number.clone(),
            location: request.location.clone(),
            status: RecordStatus::Active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %user.id, username = %user.username, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, is_staff, role,
                profile_image, phone_number, location, status,
                last_login, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.role)
        .bind(&user.profile_image)
        .bind(&user.phone_number)
        .bind(Json(&user.location))
        .bind(user.status)
        .bind(user.last_login)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let err = DbError::from(e);
            let on_email = matches!(&err, DbError::UniqueViolation { field, .. } if field == "email");
            if on_email {
                err.with_duplicate_value(user.email.clone())
            } else {
                err.with_duplicate_value(user.username.clone())
            }
        })?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Looks a user up by username or (case-insensitive) email.
    pub async fn find_by_login(&self, login: &str) -> DbResult<Option<User>> {
        let login = login.trim();
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = ?1 OR email = lower(?1) LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Applies a profile update. Absent fields keep their value.
    pub async fn update_profile(
        &self,
        id: &str,
        update: &UpdateProfileRequest,
        new_password_hash: Option<&str>,
    ) -> DbResult<User> {
        let mut user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if let Some(email) = &update.email {
            user.email = email.trim().to_lowercase();
        }
        if let Some(phone) = &update.phone_number {
            user.phone_number = Some(phone.clone());
        }
        if let Some(image) = &update.profile_image {
            user.profile_image = Some(image.clone());
        }
        if let Some(location) = &update.location {
            user.location = location.clone();
        }
        if let Some(hash) = new_password_hash {
            user.password_hash = hash.to_string();
        }
        user.updated_at = Utc::now();

        debug!(id = %id, "Updating user profile");

        sqlx::query(
            r#"
            UPDATE users SET
                email = ?2, phone_number = ?3, profile_image = ?4,
                location = ?5, password_hash = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.profile_image)
        .bind(Json(&user.location))
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(user.email.clone()))?;

        Ok(user)
    }

    pub async fn record_login(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE users SET last_login = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
