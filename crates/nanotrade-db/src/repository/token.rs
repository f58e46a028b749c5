//! # Token Repository
//!
//! Revoked API tokens, keyed by their JWT id (`jti`). A token is valid when
//! its signature and expiry check out and its `jti` is not listed here.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: SqlitePool,
}

impl TokenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TokenRepository { pool }
    }

    /// Revokes a token. Revoking twice is a no-op.
    pub async fn revoke(&self, jti: &str, user_id: &str, expires_at: DateTime<Utc>) -> DbResult<()> {
        debug!(jti = %jti, user_id = %user_id, "Revoking token");

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO revoked_tokens (jti, user_id, expires_at, revoked_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn is_revoked(&self, jti: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM revoked_tokens WHERE jti = ?1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Drops revocations of tokens that have expired anyway.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
