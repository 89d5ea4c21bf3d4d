//! Order-line history engine
//!
//! - `engine`: transition batches (prepare + apply)
//! - `store`: the `LineHistoryStore` seam and its Postgres implementation
//! - `error`: `HistoryError` and its mapping to `AppError`

pub mod engine;
pub mod error;
pub mod store;

#[cfg(test)]
mod memory;

pub use engine::TransitionBatch;
pub use error::HistoryError;
pub use store::PgLineHistory;
