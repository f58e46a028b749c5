//! Account endpoints: register, login, logout and the profile of the caller.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use nanotrade_core::{BusinessInformation, LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, User};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::AppState;

/// `POST auth/register/`
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    request.validate()?;

    let password_hash = hash_password(&request.password)?;
    let user = state.db.users().create(&request, &password_hash).await?;
    let token = state.tokens.issue(&user)?;

    info!(user_id = %user.id, role = %user.role.as_str(), "User registered");
    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token,
            user,
            business: None,
        }),
    ))
}

/// `POST auth/login/`
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let users = state.db.users();
    let user = users
        .find_by_login(request.username.trim())
        .await?
        .filter(|user| verify_password(&request.password, &user.password_hash))
        .ok_or_else(|| {
            warn!(login = %request.username, "Failed login attempt");
            ApiError::unauthorized("Invalid username or password")
        })?;

    if !user.is_active() {
        return Err(ApiError::unauthorized("Account is inactive"));
    }

    users.record_login(&user.id).await?;
    let token = state.tokens.issue(&user)?;
    let business = business_for(&state, &user).await?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        token,
        user,
        business,
    }))
}

/// `POST auth/logout/`: revokes the presented token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<StatusCode> {
    state
        .db
        .tokens()
        .revoke(&current.claims.jti, current.id(), current.claims.expires_at())
        .await?;

    info!(user_id = %current.id(), "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET auth/me/`
pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

/// `PUT auth/me/`
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(update): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    update.validate()?;

    let new_hash = match &update.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let user = state
        .db
        .users()
        .update_profile(current.id(), &update, new_hash.as_deref())
        .await?;
    Ok(Json(user))
}

/// The owner's business, or for staff the business of the shop they work in.
pub(crate) async fn business_for(state: &AppState, user: &User) -> ApiResult<Option<BusinessInformation>> {
    let businesses = state.db.businesses();
    if let Some(business) = businesses.get_by_owner(&user.id).await? {
        return Ok(Some(business));
    }

    match state.db.shops().primary_for_user(&user.id).await? {
        Some(shop) => Ok(businesses.get_by_id(&shop.business_id).await?),
        None => Ok(None),
    }
}
