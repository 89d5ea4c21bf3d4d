//! Unified error codes for the marketplace admin backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Seller errors
//! - 4xxx: Order errors
//! - 5xxx: Coupon errors
//! - 6xxx: Product and file upload errors
//! - 7xxx: Q&A and review errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the admin console can
/// switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Positional batch fields do not line up with the id list
    BatchLengthMismatch = 9,
    /// Free-text filter target is not one of the known targets
    UnknownFilterTarget = 10,
    /// Sort key is not one of the known keys
    UnknownSortKey = 11,

    // ==================== 1xxx: Auth ====================
    NotAuthenticated = 1001,
    InvalidCredentials = 1002,
    TokenExpired = 1003,
    TokenInvalid = 1004,
    /// Account behind the token was soft-deleted
    AccountDeleted = 1005,
    /// Account behind the token does not exist
    AccountNotFound = 1006,
    TooManyAttempts = 1007,

    // ==================== 2xxx: Permission ====================
    PermissionDenied = 2001,
    AdminRequired = 2002,

    // ==================== 3xxx: Seller ====================
    SellerNotFound = 3001,
    SellerLoginIdExists = 3002,
    /// Seller profile interval was closed by a concurrent edit
    SellerProfileConflict = 3003,
    SellerAttributeInvalid = 3004,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    /// No open history interval exists for the order line
    OrderLineNotFound = 4002,
    /// Open interval was closed by a concurrent transition
    OrderLineConflict = 4003,
    /// Order line is refund-complete or cancel-complete
    OrderLineTerminal = 4004,
    InvalidStatusTransition = 4005,
    OrderStatusInvalid = 4006,
    OrderBatchEmpty = 4007,

    // ==================== 5xxx: Coupon ====================
    CouponNotFound = 5001,
    CouponDateRangeInvalid = 5002,

    // ==================== 6xxx: Product ====================
    ProductNotFound = 6001,
    CategoryNotFound = 6101,

    // ==================== 65xx: File Upload ====================
    FileTooLarge = 6501,
    UnsupportedFileFormat = 6502,
    InvalidImageFile = 6503,
    NoFileProvided = 6504,
    EmptyFile = 6505,
    ImageProcessingFailed = 6508,
    FileStorageFailed = 6509,

    // ==================== 7xxx: Q&A / Review ====================
    QuestionNotFound = 7001,
    AnswerAlreadyExists = 7002,
    ReviewNotFound = 7101,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    TimeoutError = 9004,
    ConfigError = 9005,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::BatchLengthMismatch => "Batch fields do not match the number of ids",
            ErrorCode::UnknownFilterTarget => "Unknown filter target",
            ErrorCode::UnknownSortKey => "Unknown sort key",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid login id or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDeleted => "Account has been deleted",
            ErrorCode::AccountNotFound => "Account does not exist",
            ErrorCode::TooManyAttempts => "Too many attempts",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Seller
            ErrorCode::SellerNotFound => "Seller not found",
            ErrorCode::SellerLoginIdExists => "Seller login id already exists",
            ErrorCode::SellerProfileConflict => "Seller profile was modified concurrently",
            ErrorCode::SellerAttributeInvalid => "Seller attribute is invalid",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderLineNotFound => "Order line has no open history interval",
            ErrorCode::OrderLineConflict => "Order line was modified concurrently",
            ErrorCode::OrderLineTerminal => "Order line is in a terminal status",
            ErrorCode::InvalidStatusTransition => "Status transition is not allowed",
            ErrorCode::OrderStatusInvalid => "Order status is invalid",
            ErrorCode::OrderBatchEmpty => "No order lines given",

            // Coupon
            ErrorCode::CouponNotFound => "Coupon not found",
            ErrorCode::CouponDateRangeInvalid => "Coupon date range is invalid",

            // Product
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::CategoryNotFound => "Category not found",

            // File Upload
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::InvalidImageFile => "Invalid image file",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::ImageProcessingFailed => "Image processing failed",
            ErrorCode::FileStorageFailed => "File storage failed",

            // Q&A / Review
            ErrorCode::QuestionNotFound => "Question not found",
            ErrorCode::AnswerAlreadyExists => "Question already has an answer",
            ErrorCode::ReviewNotFound => "Review not found",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::BatchLengthMismatch),
            10 => Ok(ErrorCode::UnknownFilterTarget),
            11 => Ok(ErrorCode::UnknownSortKey),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::AccountDeleted),
            1006 => Ok(ErrorCode::AccountNotFound),
            1007 => Ok(ErrorCode::TooManyAttempts),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::AdminRequired),

            // Seller
            3001 => Ok(ErrorCode::SellerNotFound),
            3002 => Ok(ErrorCode::SellerLoginIdExists),
            3003 => Ok(ErrorCode::SellerProfileConflict),
            3004 => Ok(ErrorCode::SellerAttributeInvalid),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderLineNotFound),
            4003 => Ok(ErrorCode::OrderLineConflict),
            4004 => Ok(ErrorCode::OrderLineTerminal),
            4005 => Ok(ErrorCode::InvalidStatusTransition),
            4006 => Ok(ErrorCode::OrderStatusInvalid),
            4007 => Ok(ErrorCode::OrderBatchEmpty),

            // Coupon
            5001 => Ok(ErrorCode::CouponNotFound),
            5002 => Ok(ErrorCode::CouponDateRangeInvalid),

            // Product
            6001 => Ok(ErrorCode::ProductNotFound),
            6101 => Ok(ErrorCode::CategoryNotFound),

            // File Upload
            6501 => Ok(ErrorCode::FileTooLarge),
            6502 => Ok(ErrorCode::UnsupportedFileFormat),
            6503 => Ok(ErrorCode::InvalidImageFile),
            6504 => Ok(ErrorCode::NoFileProvided),
            6505 => Ok(ErrorCode::EmptyFile),
            6508 => Ok(ErrorCode::ImageProcessingFailed),
            6509 => Ok(ErrorCode::FileStorageFailed),

            // Q&A / Review
            7001 => Ok(ErrorCode::QuestionNotFound),
            7002 => Ok(ErrorCode::AnswerAlreadyExists),
            7101 => Ok(ErrorCode::ReviewNotFound),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::BatchLengthMismatch.code(), 9);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::AccountDeleted.code(), 1005);
        assert_eq!(ErrorCode::AdminRequired.code(), 2002);
        assert_eq!(ErrorCode::SellerLoginIdExists.code(), 3002);
        assert_eq!(ErrorCode::OrderLineNotFound.code(), 4002);
        assert_eq!(ErrorCode::OrderLineConflict.code(), 4003);
        assert_eq!(ErrorCode::CouponNotFound.code(), 5001);
        assert_eq!(ErrorCode::FileStorageFailed.code(), 6509);
        assert_eq!(ErrorCode::ReviewNotFound.code(), 7101);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_u16() {
        assert_eq!(ErrorCode::try_from(4003), Ok(ErrorCode::OrderLineConflict));
        assert_eq!(ErrorCode::try_from(7002), Ok(ErrorCode::AnswerAlreadyExists));
        assert_eq!(ErrorCode::try_from(8001), Err(InvalidErrorCode(8001)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::OrderLineTerminal).unwrap();
        assert_eq!(json, "4004");
        let code: ErrorCode = serde_json::from_str("1004").unwrap();
        assert_eq!(code, ErrorCode::TokenInvalid);
        assert!(serde_json::from_str::<ErrorCode>("4242").is_err());
    }

    #[test]
    fn test_messages_are_not_empty() {
        for code in [
            ErrorCode::UnknownSortKey,
            ErrorCode::TooManyAttempts,
            ErrorCode::SellerProfileConflict,
            ErrorCode::OrderBatchEmpty,
            ErrorCode::CouponDateRangeInvalid,
            ErrorCode::ImageProcessingFailed,
            ErrorCode::ConfigError,
        ] {
            assert!(!code.message().is_empty(), "{code:?}");
        }
    }
}
