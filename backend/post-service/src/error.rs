/// Error types for Post Service
///
/// Every public operation returns either a success payload or one of these
/// classified errors. Handlers never encode a failure inside a 2xx body.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Postgres SQLSTATE codes we classify explicitly
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input (empty post, empty comment text, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced post, comment, reaction or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// No verified caller identity on the request
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Caller is known but lacks rights over the target entity
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Concurrent write violated an invariant at commit time
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Media Store or Identity Directory unreachable or erroring
    #[error("Dependency failure: {0}")]
    Dependency(String),

    /// Content store unreachable, pool exhausted, or deadline exceeded
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Non-retryable database failure
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the boundary may retry the request with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Dependency(_) | AppError::Unavailable(_))
    }

    /// Stable machine-readable kind, also used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Conflict(_) => "conflict",
            AppError::Dependency(_) => "dependency",
            AppError::Unavailable(_) => "unavailable",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Dependency(_) | AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut builder = HttpResponse::build(status);
        if self.is_retryable() {
            builder.insert_header(("Retry-After", "1"));
        }

        builder.json(serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "status": status.as_u16(),
            "retryable": self.is_retryable(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => AppError::Conflict(format!(
                    "duplicate record detected at commit: {}",
                    db_err.message()
                )),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    AppError::Conflict(format!("concurrent write aborted: {}", db_err.message()))
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    AppError::NotFound(format!("referenced post no longer exists: {}", db_err.message()))
                }
                _ => AppError::Database(err.to_string()),
            },
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(format!("migration failed: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_distinct_statuses() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Dependency("x".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn store_unavailability_is_retryable_not_not_found() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::Unavailable(_)));
        assert!(err.is_retryable());
        assert_ne!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn row_not_found_is_a_database_error() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn retryable_errors_carry_retry_after() {
        let resp = AppError::Dependency("media store down".into()).error_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(resp.headers().contains_key("Retry-After"));

        let resp = AppError::Validation("empty".into()).error_response();
        assert!(!resp.headers().contains_key("Retry-After"));
    }
}
