//! Document backend traits
//!
//! The assembler and merge stage only know how to order files; turning
//! images into a document and joining documents is delegated to a backend.

use std::path::{Path, PathBuf};

/// Error type returned by backends
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Converts images into documents and merges documents
///
/// Implementations are called from blocking worker threads and must be
/// thread-safe.
pub trait DocumentBackend: Send + Sync {
    /// Writes one document at `output` containing `images` as pages, in order
    fn convert(&self, images: &[PathBuf], output: &Path) -> Result<(), BackendError>;

    /// Writes one document at `output` containing all pages of `parts`, in order
    fn merge(&self, parts: &[PathBuf], output: &Path) -> Result<(), BackendError>;
}
