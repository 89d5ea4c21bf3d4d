//! Object storage

pub mod images;

pub use images::{ImageStorage, StoredImage};
