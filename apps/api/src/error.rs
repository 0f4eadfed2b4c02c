//! # API Errors
//!
//! Every handler returns [`ApiResult`]; the error side renders as JSON.
//!
//! ```text
//! ┌──────────────┬──────┬──────────────────────────┐
//! │ ApiError     │ HTTP │ Body                     │
//! ├──────────────┼──────┼──────────────────────────┤
//! │ Validation   │ 400  │ { error }                │
//! │ State        │ 400  │ { error }                │
//! │ Unauthorized │ 401  │ { error }                │
//! │ Forbidden    │ 403  │ { error, required }      │
//! │ NotFound     │ 404  │ { error }                │
//! │ Conflict     │ 409  │ { error, retryable }     │
//! │ Internal     │ 500  │ { error }                │
//! └──────────────┴──────┴──────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use saori_core::{CoreError, ValidationError};
use saori_db::DbError;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    /// The operation does not fit the entity's current state.
    #[error("{0}")]
    State(String),

    /// Missing, invalid or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Missing permission: {required}")]
    Forbidden { required: String },

    #[error("{0}")]
    NotFound(String),

    /// Collides with existing data or with a concurrent writer. Retryable
    /// conflicts may succeed when the same request is sent again.
    #[error("{message}")]
    Conflict { message: String, retryable: bool },

    /// Details are logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::State(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Forbidden { required } => json!({
                "error": self.to_string(),
                "required": required,
            }),
            ApiError::Conflict { message, retryable } => json!({
                "error": message,
                "retryable": retryable,
            }),
            ApiError::Internal(detail) => {
                error!(%detail, "Request failed");
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CoreError::InvalidState(message) => ApiError::State(message),
            CoreError::Forbidden { required } => ApiError::Forbidden { required },
            CoreError::Conflict(message) => ApiError::Conflict {
                message,
                retryable: false,
            },
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        let retryable = err.is_retryable();
        match err {
            DbError::Core(core) => core.into(),
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::Busy | DbError::PoolExhausted => {
                ApiError::Conflict {
                    message: err.to_string(),
                    retryable,
                }
            }
            DbError::ForeignKeyViolation { .. } => ApiError::Validation(err.to_string()),
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::Internal(_) => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (ValidationError::required("name").into(), StatusCode::BAD_REQUEST),
            (CoreError::invalid_state("ya convertida").into(), StatusCode::BAD_REQUEST),
            (CoreError::not_found("Quote", "q-1").into(), StatusCode::NOT_FOUND),
            (DbError::duplicate("users.email").into(), StatusCode::CONFLICT),
            (DbError::Busy.into(), StatusCode::CONFLICT),
            (DbError::QueryFailed("boom".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn test_conflicts_carry_retryable_flag() {
        let email: ApiError = DbError::duplicate("users.email").into();
        assert!(matches!(email, ApiError::Conflict { retryable: false, .. }));

        let folio: ApiError = DbError::duplicate("sales.folio").into();
        assert!(matches!(folio, ApiError::Conflict { retryable: true, .. }));

        let busy: ApiError = DbError::Busy.into();
        assert!(matches!(busy, ApiError::Conflict { retryable: true, .. }));
    }
}
