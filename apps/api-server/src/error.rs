//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the API Server                         │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                     │
//! │         │                                                               │
//! │         ├── DbError::NotFound ─────────────────────► 404 NOT_FOUND      │
//! │         ├── DbError::UniqueViolation / Conflict ───► 409 CONFLICT       │
//! │         ├── CoreError::InsufficientStock ──────────► 422 INSUFFICIENT_  │
//! │         │                                                    STOCK      │
//! │         ├── CoreError::PermissionDenied ───────────► 403 FORBIDDEN      │
//! │         ├── ValidationError ───────────────────────► 400 VALIDATION_    │
//! │         │                                                    ERROR      │
//! │         └── sqlx / pool / io failure ──► logged ───► 500 INTERNAL       │
//! │                                                                         │
//! │  Body: {"code": "NOT_FOUND", "message": "Product not found: ..."}       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal details are logged with `tracing::error!` and replaced by a
//! generic message in the response.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nanotrade_core::{CoreError, ValidationError};
use nanotrade_db::DbError;
use serde::Serialize;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 5f0c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Missing, invalid, expired or revoked token (401)
    Unauthorized,

    /// Role lacks the permission (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Duplicate value or dependent rows (409)
    Conflict,

    /// Insufficient stock (422)
    InsufficientStock,

    /// Cart operation failed (422)
    CartError,

    /// Payment processing error (422)
    PaymentError,

    /// Business logic error (422)
    BusinessLogic,

    /// Upload too large (413)
    PayloadTooLarge,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock
            | ErrorCode::CartError
            | ErrorCode::PaymentError
            | ErrorCode::BusinessLogic => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessLogic, message)
    }

    /// Logs `detail` and returns a generic internal error.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", detail);
        ApiError::new(ErrorCode::Internal, "Internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::conflict(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::conflict("The record is referenced by, or references, missing data")
            }
            DbError::Rule(e) => ApiError::from(e),
            DbError::Conflict(message) => ApiError::conflict(message),
            DbError::ConnectionFailed(e) => ApiError::internal(format!("connection failed: {}", e)),
            DbError::MigrationFailed(e) => ApiError::internal(format!("migration failed: {}", e)),
            DbError::QueryFailed(e) => ApiError::internal(format!("query failed: {}", e)),
            DbError::TransactionFailed(e) => {
                ApiError::internal(format!("transaction failed: {}", e))
            }
            DbError::PoolExhausted => ApiError::internal("connection pool exhausted"),
            DbError::Internal(e) => ApiError::internal(format!("database: {}", e)),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(_) => ApiError::new(ErrorCode::NotFound, message),
            CoreError::InsufficientStock { .. }
            | CoreError::AboveMaximumStock { .. }
            | CoreError::OutOfStock { .. } => ApiError::new(ErrorCode::InsufficientStock, message),
            CoreError::InvalidSaleStatus { .. } | CoreError::InvalidEscrowTransition { .. } => {
                ApiError::business(message)
            }
            CoreError::CartTooLarge { .. } | CoreError::EmptyCart | CoreError::NotInCart(_) => {
                ApiError::new(ErrorCode::CartError, message)
            }
            CoreError::QuantityTooLarge { .. } => ApiError::validation(message),
            CoreError::InvalidPaymentAmount { .. } => ApiError::new(ErrorCode::PaymentError, message),
            CoreError::PermissionDenied { .. } => ApiError::new(ErrorCode::Forbidden, message),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::new(ErrorCode::PayloadTooLarge, "Upload is too large");
        }
        ApiError::validation(format!("Invalid form data: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_errors_are_unprocessable() {
        let err = ApiError::from(DbError::Rule(CoreError::InsufficientStock {
            sku: "RICE-25KG".to_string(),
            available: 3,
            requested: 5,
        }));
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("RICE-25KG"));
    }

    #[test]
    fn test_duplicates_conflict() {
        let err = ApiError::from(DbError::duplicate("sku", "OIL-5L"));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message, "sku 'OIL-5L' already exists");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::from(DbError::QueryFailed("near \"SELEC\": syntax error".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_permission_denied_is_forbidden() {
        let err = ApiError::from(CoreError::PermissionDenied {
            role: "seller".to_string(),
            action: "manage the catalog".to_string(),
        });
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiError::not_found("Product", "abc")).unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Product not found: abc");
    }
}
