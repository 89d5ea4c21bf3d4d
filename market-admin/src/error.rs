//! Unified service-layer error type
//!
//! `ServiceError` bridges DB-layer errors (`sqlx::Error`, `BoxError`) and the
//! API-layer error (`AppError`), so services can use `?` on both.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::orders::HistoryError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error.
///
/// - `Db`: database/infrastructure errors (logged, mapped to DatabaseError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    /// Database or infrastructure error (sqlx, AWS SDK, etc.)
    Db(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServiceError::App(e.into())
    }
}

impl From<HistoryError> for ServiceError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::Storage(inner) => ServiceError::Db(inner),
            other => ServiceError::App(other.into()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// `true` when a DB-layer error is a Postgres unique violation (23505).
pub fn is_unique_violation(err: &BoxError) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(sqlx::Error::as_database_error)
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_maps_to_database_error() {
        let err = ServiceError::Db("connection reset".into());
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
        // infrastructure detail never reaches the client
        assert!(!app.message.contains("connection reset"));
    }

    #[test]
    fn test_app_error_passes_through() {
        let err = ServiceError::from(AppError::line_conflict(4821));
        let app: AppError = err.into();
        assert_eq!(app.code, ErrorCode::OrderLineConflict);
    }

    #[test]
    fn test_unique_violation_needs_a_database_error() {
        assert!(!is_unique_violation(&"duplicate key".into()));
        let not_found: BoxError = sqlx::Error::RowNotFound.into();
        assert!(!is_unique_violation(&not_found));
    }

    #[test]
    fn test_history_errors_are_classified() {
        let app: AppError = ServiceError::from(HistoryError::LineNotFound(7)).into();
        assert_eq!(app.code, ErrorCode::OrderLineNotFound);

        let app: AppError = ServiceError::from(HistoryError::Storage("disk".into())).into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
    }
}
