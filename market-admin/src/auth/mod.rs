//! Authentication middleware for seller and admin requests

pub mod rate_limit;
pub mod seller_auth;

pub use seller_auth::Principal;
