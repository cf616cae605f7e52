//! # API Error Type
//!
//! Every handler returns `Result<_, ApiError>`.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Handler                                                                │
//! │     │                                                                   │
//! │     ├── ValidationError ──────────────────────► 400 VALIDATION_ERROR    │
//! │     ├── missing / bad token ──────────────────► 401 UNAUTHORIZED        │
//! │     ├── DbError::NotFound ────────────────────► 404 NOT_FOUND           │
//! │     ├── DbError::Conflict / UniqueViolation ──► 409 CONFLICT/DUPLICATE  │
//! │     ├── DbError::Domain(CoreError) ───────────► 422 BUSINESS_RULE       │
//! │     └── anything else ────────────────────────► 500 (details logged)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! ```json
//! { "success": false, "code": "NOT_FOUND", "error": "Room not found: r-1" }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use innkeep_core::{CoreError, ValidationError};
use innkeep_db::DbError;
use serde::Serialize;

/// API error returned from handlers.
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

    /// Missing or invalid token (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Stale version or concurrent write (409)
    Conflict,

    /// Unique key already taken (409)
    Duplicate,

    /// A record is still referenced (409)
    InUse,

    /// Business rule rejected the change (422)
    BusinessRule,

    /// Stock would go negative (422)
    InsufficientStock,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict | ErrorCode::Duplicate | ErrorCode::InUse => StatusCode::CONFLICT,
            ErrorCode::BusinessRule | ErrorCode::InsufficientStock => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::Duplicate, err.to_string()),
            DbError::Conflict { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(
                    ErrorCode::InUse,
                    "Invalid reference, or the record is still in use",
                )
            }
            DbError::Domain(e) => ApiError::from(e),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy, try again")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", other);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ApiError::from(e),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            other => ApiError::new(ErrorCode::BusinessRule, other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    code: ErrorCode,
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            code: self.code,
            error: &self.message,
        };
        (self.code.status(), Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use innkeep_core::Money;

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = DbError::not_found("Room", "r-1").into();
        assert_eq!(not_found.code.status(), StatusCode::NOT_FOUND);

        let stale: ApiError = DbError::conflict("Ledger", "l-1").into();
        assert_eq!(stale.code.status(), StatusCode::CONFLICT);

        let rule: ApiError = DbError::Domain(CoreError::PaymentExceedsDue {
            amount: Money::from_rupees(500),
            due: Money::from_rupees(100),
        })
        .into();
        assert_eq!(rule.code, ErrorCode::BusinessRule);
        assert_eq!(rule.code.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let invalid: ApiError = DbError::from(ValidationError::Required {
            field: "guest name".into(),
        })
        .into();
        assert_eq!(invalid.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err: ApiError = DbError::QueryFailed("no such table: rooms".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("rooms"));
    }
}
