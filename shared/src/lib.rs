//! Shared types for the market admin
//!
//! Error codes, response envelopes, pagination and the data models used by
//! the admin server and its API clients.

pub mod error;
pub mod models;
pub mod pagination;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use pagination::{Page, PaginatedResponse};
