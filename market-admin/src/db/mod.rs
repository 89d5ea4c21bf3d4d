//! Schema accessors
//!
//! Free functions over `&PgPool` for reads and `&mut PgConnection` for
//! writes inside a caller-owned transaction.

pub mod coupon;
pub mod order;
pub mod product;
pub mod qna;
pub mod query;
pub mod review;
pub mod seller;
pub mod user;
