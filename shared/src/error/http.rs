//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::SellerNotFound
            | Self::OrderNotFound
            | Self::OrderLineNotFound
            | Self::CouponNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::QuestionNotFound
            | Self::ReviewNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::SellerLoginIdExists
            | Self::SellerProfileConflict
            | Self::OrderLineConflict
            | Self::OrderLineTerminal
            | Self::InvalidStatusTransition
            | Self::AnswerAlreadyExists => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::AccountNotFound => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::AdminRequired => StatusCode::FORBIDDEN,

            Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,

            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            // 503 Service Unavailable (transient, caller may retry)
            Self::TimeoutError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::ImageProcessingFailed
            | Self::FileStorageFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (validation, deleted account, unknown keys)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
