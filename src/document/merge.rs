use crate::document::assembler::Artifact;
use crate::document::backend::DocumentBackend;
use crate::document::DocumentError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Prefix of the scratch directory created inside the series directory
const SCRATCH_PREFIX: &str = "pdfgen";

/// Temporary directory holding intermediate documents
///
/// The directory is removed by `close`, or on drop if `close` is never
/// reached.
#[derive(Debug)]
pub struct ScratchArea {
    dir: TempDir,
}

impl ScratchArea {
    /// Creates a fresh scratch directory inside `parent`
    pub fn create_in(parent: &Path) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory and everything in it
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Merges intermediate documents into `output`, ordered by batch ordinal
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the merged document
/// * `Err(DocumentError)` - No artifacts were given or the backend failed
pub async fn merge_artifacts(
    backend: Arc<dyn DocumentBackend>,
    mut artifacts: Vec<Artifact>,
    output: &Path,
) -> Result<PathBuf, DocumentError> {
    if artifacts.is_empty() {
        return Err(DocumentError::Merge("no intermediate documents to merge".to_string()));
    }

    artifacts.sort_by_key(|artifact| artifact.ordinal);
    let parts: Vec<PathBuf> = artifacts.into_iter().map(|artifact| artifact.path).collect();

    let target = output.to_path_buf();
    tokio::task::spawn_blocking(move || backend.merge(&parts, &target))
        .await
        .map_err(|e| DocumentError::TaskFailed(e.to_string()))?
        .map_err(|e| DocumentError::Merge(e.to_string()))?;

    Ok(output.to_path_buf())
}
