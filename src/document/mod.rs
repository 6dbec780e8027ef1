//! Document module for turning downloaded pages into one PDF
//!
//! This module contains:
//! - The batch planner that splits pages into fixed-size batches
//! - The assembler that converts batches into intermediate documents in parallel
//! - The merge stage that joins intermediate documents in batch order
//! - The `lopdf` backend that performs the actual conversion and merge

mod assembler;
mod backend;
mod merge;
mod pdf;
mod planner;

pub use assembler::{Artifact, Assembler};
pub use backend::{BackendError, DocumentBackend};
pub use merge::{merge_artifacts, ScratchArea};
pub use pdf::{images_to_pdf, merge_pdfs, PdfBackend, PdfError};
pub use planner::{plan, Batch};

use crate::config::DocumentConfig;
use crate::store::ItemStore;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while assembling the final document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("pdf workers must be between 1 and {}", tokio::sync::Semaphore::MAX_PERMITS)]
    InvalidWorkerCount,

    #[error("failed to convert chunk {ordinal} (pages {first} - {last}): {message}")]
    Conversion {
        ordinal: usize,
        first: u64,
        last: u64,
        message: String,
    },

    #[error("failed to merge documents: {0}")]
    Merge(String),

    #[error("scratch directory error: {0}")]
    Scratch(std::io::Error),

    #[error("document task failed: {0}")]
    TaskFailed(String),

    #[error("document assembly cancelled")]
    Cancelled,
}

/// Builds the final document for pages `1..=count`
///
/// This is the entry point for the document stage. It will:
/// 1. Plan fixed-size batches
/// 2. Create a scratch directory inside the series directory
/// 3. Convert batches in parallel
/// 4. Merge the intermediate documents in batch order
/// 5. Remove the scratch directory, whether or not the previous steps failed
///
/// # Returns
///
/// * `Ok(Some(PathBuf))` - Path of the merged document
/// * `Ok(None)` - There were no pages, nothing was built
/// * `Err(DocumentError)` - A stage failed; the scratch directory is already gone
pub async fn build_document(
    backend: Arc<dyn DocumentBackend>,
    store: &ItemStore,
    count: u64,
    config: &DocumentConfig,
) -> Result<Option<PathBuf>, DocumentError> {
    let batches = plan(count, config.batch_size);
    if batches.is_empty() {
        return Ok(None);
    }

    let assembler = Assembler::new(Arc::clone(&backend), config.workers)?;
    let output = store.dir().join(&config.output_name);
    let scratch = ScratchArea::create_in(store.dir()).map_err(DocumentError::Scratch)?;

    tracing::info!(
        "Assembling {} pages in {} chunk(s) of up to {}",
        count,
        batches.len(),
        config.batch_size
    );

    let result = async {
        let artifacts = assembler.assemble(&batches, store, scratch.path()).await?;
        tracing::info!("Merging {} chunk(s) into {}", artifacts.len(), output.display());
        merge_artifacts(backend, artifacts, &output).await
    }
    .await;

    tracing::info!("Clean up temporary files");
    let cleanup = scratch.close();

    let output = result?;
    cleanup.map_err(DocumentError::Scratch)?;

    Ok(Some(output))
}
