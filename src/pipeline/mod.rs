//! Pipeline module tying the stages together
//!
//! A run prepares the series directory, downloads every page, and then
//! optionally builds the merged document from the downloaded pages.

mod summary;

pub use summary::{print_summary, RunSummary};

use crate::config::{validate, Config};
use crate::discovery::discover;
use crate::document::{build_document, DocumentBackend, PdfBackend};
use crate::series::{ItemLocator, SeriesId};
use crate::store::ItemStore;
use crate::HarvestError;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Runs a complete download using the PDF backend
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `series` - The series to download
///
/// # Returns
///
/// * `Ok(RunSummary)` - Run completed successfully
/// * `Err(HarvestError)` - Run failed; pages already saved stay on disk
pub async fn run_series(config: &Config, series: SeriesId) -> crate::Result<RunSummary> {
    run_series_with_backend(config, series, Arc::new(PdfBackend::new())).await
}

/// Runs a complete download with a caller-supplied document backend
pub async fn run_series_with_backend(
    config: &Config,
    series: SeriesId,
    backend: Arc<dyn DocumentBackend>,
) -> crate::Result<RunSummary> {
    validate(config)?;

    let started_at = Utc::now();
    let start = Instant::now();

    let series_dir = prepare_series_dir(&config.output.directory, &series)?;
    let store = ItemStore::new(&series_dir);
    let locator = ItemLocator::new(&config.source.base_url, series.clone())?;

    tracing::info!("Downloading series {} into {}", series, series_dir.display());
    let report = discover(&config.source, locator, store.clone(), config.download.workers).await?;
    tracing::info!(
        "Saved {} pages for series {} ({} downloaded, {} already on disk)",
        report.count,
        series,
        report.downloaded,
        report.resumed
    );

    let artifact = if !config.document.enabled {
        tracing::info!("Document generation disabled, skipping");
        None
    } else if report.count == 0 {
        tracing::warn!("No pages found for series {}, skipping document", series);
        None
    } else {
        let artifact = build_document(backend, &store, report.count, &config.document).await?;
        if let Some(path) = &artifact {
            tracing::info!("Generated pdf at: {}", path.display());
        }
        artifact
    };

    Ok(RunSummary {
        series,
        series_dir,
        items_found: report.count,
        items_downloaded: report.downloaded,
        items_resumed: report.resumed,
        spurious_items: report.spurious,
        artifact,
        started_at,
        elapsed: start.elapsed(),
    })
}

/// Creates `<root>/<series>`, reusing it if it already exists
pub fn prepare_series_dir(root: &Path, series: &SeriesId) -> crate::Result<PathBuf> {
    let dir = root.join(series.as_str());
    let directory_error = |source: std::io::Error| HarvestError::Directory {
        path: dir.clone(),
        source,
    };

    std::fs::create_dir_all(root).map_err(directory_error)?;

    match std::fs::create_dir(&dir) {
        Ok(()) => {
            tracing::debug!("Created folder {}", dir.display());
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => {
            tracing::info!("Folder {} already exists", dir.display());
        }
        Err(e) => return Err(directory_error(e)),
    }

    Ok(dir)
}
