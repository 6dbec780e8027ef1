//! Item store for persisting downloaded pages
//!
//! Each item of a series is stored as `<index>.png` inside the series
//! directory. Writes go through a `.part` file that is renamed into place once
//! every byte has been copied, so a truncated item is never mistaken for a
//! completed one.

mod disk;

pub use disk::ItemStore;

use thiserror::Error;

/// Errors that can occur while persisting an item
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write item {index} to {path}: {source}")]
    Write {
        index: u64,
        path: String,
        source: std::io::Error,
    },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
