//! Discovery module for downloading a page series
//!
//! The number of pages in a series is not known up front. This module
//! contains:
//! - The fetch probe that downloads and classifies a single page
//! - The shared series state that hands out indices and tracks outcomes
//! - The coordinator that runs probes in parallel until the series ends

mod coordinator;
mod probe;
mod state;

pub use coordinator::{Coordinator, DiscoveryReport};
pub use probe::{build_http_client, Probe, ProbeOutcome};
pub use state::SeriesState;

use crate::config::SourceConfig;
use crate::series::ItemLocator;
use crate::store::{ItemStore, StoreError};
use thiserror::Error;

/// Errors that abort a download
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("transport error for page {index} ({url}): {source}")]
    Transport {
        index: u64,
        url: String,
        source: reqwest::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("download cancelled before the end of the series was found")]
    Cancelled,

    #[error("probe task failed: {0}")]
    TaskFailed(String),
}

/// Downloads every page of a series into `store`
///
/// This is the main entry point for the download stage. It will:
/// 1. Build the HTTP client
/// 2. Probe pages in parallel with `workers` probes in flight
/// 3. Stop claiming pages at the first end-of-series response
/// 4. Wait for in-flight probes and report the contiguous page count
///
/// # Returns
///
/// * `Ok(DiscoveryReport)` - Download finished
/// * `Err(DiscoveryError)` - A page failed with a fatal error
pub async fn discover(
    source: &SourceConfig,
    locator: ItemLocator,
    store: ItemStore,
    workers: usize,
) -> Result<DiscoveryReport, DiscoveryError> {
    let client = build_http_client(source)?;
    let probe = Probe::new(client, locator, store);
    Coordinator::new(probe, workers).run().await
}
