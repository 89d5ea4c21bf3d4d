//! Domain services
//!
//! Each operation validates its input, checks the principal's scope, then
//! runs its writes in one transaction. Errors are `ServiceError`.

pub mod board;
pub mod coupon;
pub mod order;
pub mod product;
pub mod seller;
pub mod user;
