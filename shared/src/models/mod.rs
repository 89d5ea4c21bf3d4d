//! Data models
//!
//! Shared between market-admin and the admin frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (PostgreSQL BIGSERIAL).

pub mod board;
pub mod coupon;
pub mod order;
pub mod product;
pub mod seller;
pub mod user;

// Re-exports
pub use board::*;
pub use coupon::*;
pub use order::*;
pub use product::*;
pub use seller::*;
pub use user::*;
