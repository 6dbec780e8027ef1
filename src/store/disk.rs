use crate::store::{StoreError, StoreResult};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Extension of completed items
const ITEM_EXTENSION: &str = "png";

/// Suffix of items still being written
const PARTIAL_SUFFIX: &str = "part";

/// On-disk store for the items of one series
///
/// The namespace is partitioned by index, so concurrent writers for
/// different indices never touch the same file.
#[derive(Debug, Clone)]
pub struct ItemStore {
    dir: PathBuf,
}

impl ItemStore {
    /// Creates a store rooted at an existing series directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the series directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the deterministic path of a completed item
    pub fn item_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{}.{}", index, ITEM_EXTENSION))
    }

    fn partial_path(&self, index: u64) -> PathBuf {
        self.dir
            .join(format!("{}.{}.{}", index, ITEM_EXTENSION, PARTIAL_SUFFIX))
    }

    /// Returns true if a completed item already exists for `index`
    pub async fn has(&self, index: u64) -> bool {
        tokio::fs::metadata(self.item_path(index))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    /// Copies `content` into the item file for `index`
    ///
    /// The bytes are written to a partial file which is flushed, closed and
    /// then renamed into place. On failure the partial file is removed.
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of bytes written
    /// * `Err(StoreError)` - The item could not be persisted
    pub async fn put<R>(&self, index: u64, mut content: R) -> StoreResult<u64>
    where
        R: AsyncRead + Unpin,
    {
        let partial = self.partial_path(index);
        let target = self.item_path(index);

        let result = async {
            let mut file = tokio::fs::File::create(&partial).await?;
            let written = tokio::io::copy(&mut content, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&partial, &target).await?;
            Ok::<u64, std::io::Error>(written)
        }
        .await;

        match result {
            Ok(written) => Ok(written),
            Err(source) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(StoreError::Write {
                    index,
                    path: target.display().to_string(),
                    source,
                })
            }
        }
    }
}
