//! Batch assembler - converts batches into intermediate documents
//!
//! Batches are independent, so they are converted in parallel by a bounded
//! pool. Completion order is not preserved; each artifact carries its batch
//! ordinal so the merge stage can restore document order.

use crate::document::backend::DocumentBackend;
use crate::document::planner::Batch;
use crate::document::DocumentError;
use crate::store::ItemStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// An intermediate document produced from one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Ordinal of the batch this artifact was built from
    pub ordinal: usize,

    /// The batch this artifact was built from
    pub batch: Batch,

    /// Location of the intermediate document
    pub path: PathBuf,
}

/// Bounded pool that converts batches through a document backend
pub struct Assembler {
    backend: Arc<dyn DocumentBackend>,
    workers: usize,
    cancel: CancellationToken,
}

impl Assembler {
    /// Creates a new assembler
    ///
    /// # Returns
    ///
    /// * `Err(DocumentError::InvalidWorkerCount)` - `workers` is zero or above
    ///   `Semaphore::MAX_PERMITS`
    pub fn new(backend: Arc<dyn DocumentBackend>, workers: usize) -> Result<Self, DocumentError> {
        if workers == 0 || workers > Semaphore::MAX_PERMITS {
            return Err(DocumentError::InvalidWorkerCount);
        }

        Ok(Self {
            backend,
            workers,
            cancel: CancellationToken::new(),
        })
    }

    /// Uses an external token so a caller can stop assembly early
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the intermediate document path for a batch ordinal
    pub fn artifact_path(scratch: &Path, ordinal: usize) -> PathBuf {
        scratch.join(format!("{}.pdf", ordinal))
    }

    /// Converts every batch into `<scratch>/<ordinal>.pdf`
    ///
    /// The first conversion failure stops new batches from starting; the
    /// call returns only after every started conversion has finished.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Artifact>)` - One artifact per batch, in completion order
    /// * `Err(DocumentError)` - The first failure
    pub async fn assemble(
        &self,
        batches: &[Batch],
        store: &ItemStore,
        scratch: &Path,
    ) -> Result<Vec<Artifact>, DocumentError> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks: JoinSet<Result<Artifact, DocumentError>> = JoinSet::new();

        for &batch in batches {
            let permit = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                permit = semaphore.clone().acquire_owned() => {
                    permit.map_err(|_| DocumentError::Cancelled)?
                }
            };

            let images: Vec<PathBuf> = batch.indices().map(|i| store.item_path(i)).collect();
            let output = Self::artifact_path(scratch, batch.ordinal);
            let backend = Arc::clone(&self.backend);
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                let _permit = permit;

                tracing::info!(
                    "Processing chunk {} [pages {} - {}]",
                    batch.ordinal,
                    batch.first,
                    batch.last
                );

                let target = output.clone();
                let converted = tokio::task::spawn_blocking(move || backend.convert(&images, &target))
                    .await
                    .map_err(|e| DocumentError::TaskFailed(e.to_string()))?;

                match converted {
                    Ok(()) => {
                        tracing::info!(
                            "Completed chunk {} [pages {} - {}]",
                            batch.ordinal,
                            batch.first,
                            batch.last
                        );
                        Ok(Artifact {
                            ordinal: batch.ordinal,
                            batch,
                            path: output,
                        })
                    }
                    Err(e) => {
                        cancel.cancel();
                        Err(DocumentError::Conversion {
                            ordinal: batch.ordinal,
                            first: batch.first,
                            last: batch.last,
                            message: e.to_string(),
                        })
                    }
                }
            });
        }

        let mut artifacts = Vec::with_capacity(batches.len());
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| DocumentError::TaskFailed(e.to_string()));
            match result.and_then(|r| r) {
                Ok(artifact) => artifacts.push(artifact),
                Err(e) => {
                    tracing::error!("Document assembly failed: {}", e);
                    self.cancel.cancel();
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        if artifacts.len() != batches.len() {
            return Err(DocumentError::Cancelled);
        }

        Ok(artifacts)
    }
}
