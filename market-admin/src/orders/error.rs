use shared::error::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Order-line history errors
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Batch contains no order lines")]
    BatchEmpty,

    #[error("{field} has {actual} entries but {expected} line ids were given")]
    BatchLengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Order line {0} appears more than once in the batch")]
    DuplicateLine(i64),

    #[error("Unknown order status: {0}")]
    InvalidStatus(i32),

    #[error("Order line {0} has no open interval")]
    LineNotFound(i64),

    #[error("Order line {0} was transitioned concurrently")]
    Conflict(i64),

    #[error("Order line {line_id} is {status} and cannot transition")]
    Terminal { line_id: i64, status: OrderStatus },

    #[error("Order line {line_id} cannot move from {from} to {to}")]
    InvalidTransition {
        line_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Storage error: {0}")]
    Storage(BoxError),
}

impl From<sqlx::Error> for HistoryError {
    fn from(e: sqlx::Error) -> Self {
        HistoryError::Storage(e.into())
    }
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        let message = err.to_string();
        match err {
            HistoryError::BatchEmpty => AppError::with_message(ErrorCode::OrderBatchEmpty, message),
            HistoryError::BatchLengthMismatch {
                field,
                expected,
                actual,
            } => AppError::with_message(ErrorCode::BatchLengthMismatch, message)
                .with_detail("field", field)
                .with_detail("expected", expected)
                .with_detail("actual", actual),
            HistoryError::DuplicateLine(line_id) => {
                AppError::with_message(ErrorCode::InvalidRequest, message)
                    .with_detail("line_id", line_id)
            }
            HistoryError::InvalidStatus(status) => {
                AppError::with_message(ErrorCode::OrderStatusInvalid, message)
                    .with_detail("status", status)
            }
            HistoryError::LineNotFound(line_id) => AppError::line_not_found(line_id),
            HistoryError::Conflict(line_id) => AppError::line_conflict(line_id),
            HistoryError::Terminal { line_id, status } => {
                AppError::with_message(ErrorCode::OrderLineTerminal, message)
                    .with_detail("line_id", line_id)
                    .with_detail("status", status.id())
            }
            HistoryError::InvalidTransition { line_id, from, to } => {
                AppError::with_message(ErrorCode::InvalidStatusTransition, message)
                    .with_detail("line_id", line_id)
                    .with_detail("from", from.id())
                    .with_detail("to", to.id())
            }
            HistoryError::Storage(e) => {
                tracing::error!(error = %e, "Order history storage error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

pub type HistoryResult<T> = Result<T, HistoryError>;
