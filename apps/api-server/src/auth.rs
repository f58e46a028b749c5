//! # Authentication
//!
//! API tokens, password hashing and the request extractors that resolve who
//! is calling and for which shop.
//!
//! ```text
//! Authorization: Token <jwt>      (Bearer <jwt> accepted too)
//!        │
//!        ▼
//! TokenManager::verify ──► Claims { sub, jti, exp, role }
//!        │
//!        ▼
//! tokens().is_revoked(jti)? ──yes──► 401
//!        │ no
//!        ▼
//! users().get_by_id(sub) ──► CurrentUser
//!        │
//!        ▼  ?shop=<id> or the user's first shop
//! ShopScope { user, shop }
//! ```

use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::header::AUTHORIZATION;
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use nanotrade_core::{Permission, Shop, User, UserRole};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::AppState;

// =============================================================================
// Tokens
// =============================================================================

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub username: String,

    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID, the handle logout revokes
    pub jti: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Issues and verifies HS256 API tokens.
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenManager {
    pub fn new(secret: &str, lifetime_secs: u64) -> Self {
        TokenManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::seconds(i64::try_from(lifetime_secs).unwrap_or(i64::MAX / 1000)),
        }
    }

    /// Signs a token for `user`.
    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.lifetime)
                .ok_or_else(|| ApiError::internal("Token lifetime out of range"))?
                .timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token validation failed: {}", e);
                ApiError::unauthorized("Invalid or expired token")
            })
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// Accepts both `Token <t>` and `Bearer <t>`.
pub fn extract_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Extractors
// =============================================================================

/// The signed in user of a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub claims: Claims,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn require(&self, permission: Permission) -> ApiResult<()> {
        Ok(self.user.role.require(permission)?)
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                debug!(uri = %parts.uri, "Missing Authorization header");
                ApiError::unauthorized("Authentication credentials were not provided")
            })?;

        let token = extract_token(header)
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header"))?;

        let claims = state.tokens.verify(token)?;

        if state.db.tokens().is_revoked(&claims.jti).await? {
            warn!(user_id = %claims.sub, jti = %claims.jti, "Revoked token presented");
            return Err(ApiError::unauthorized("Token has been revoked"));
        }

        let user = state
            .db
            .users()
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

        if !user.is_active() {
            warn!(user_id = %user.id, "Inactive user presented a token");
            return Err(ApiError::unauthorized("Account is inactive"));
        }

        let current = CurrentUser { user, claims };
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

#[derive(Debug, Deserialize)]
struct ShopQuery {
    shop: Option<String>,
}

/// The shop a request acts on, with the user acting on it.
///
/// Taken from `?shop=<id>` (the shop must be owned by, or employ, the user)
/// or else the user's first shop.
#[derive(Debug, Clone)]
pub struct ShopScope {
    pub user: User,
    pub shop: Shop,
}

impl ShopScope {
    pub fn shop_id(&self) -> &str {
        &self.shop.id
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn require(&self, permission: Permission) -> ApiResult<()> {
        Ok(self.user.role.require(permission)?)
    }
}

impl FromRequestParts<Arc<AppState>> for ShopScope {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;

        let requested = Query::<ShopQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q.shop)
            .unwrap_or(None)
            .filter(|id| !id.trim().is_empty());

        let shops = state.db.shops();
        let shop = match &requested {
            Some(shop_id) => shops
                .get_for_user(shop_id, current.id())
                .await?
                .ok_or_else(|| ApiError::not_found("Shop", shop_id))?,
            None => shops.primary_for_user(current.id()).await?.ok_or_else(|| {
                ApiError::new(ErrorCode::NotFound, "No shop yet: create a shop first")
            })?,
        };

        Ok(ShopScope {
            user: current.user,
            shop,
        })
    }
}
