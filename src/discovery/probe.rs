//! Fetch probe implementation
//!
//! This module handles the HTTP side of a download:
//! - Building the HTTP client from the source configuration
//! - Skipping items that are already on disk
//! - Classifying responses by status code
//! - Writing successful bodies through the item store

use crate::config::SourceConfig;
use crate::discovery::DiscoveryError;
use crate::series::ItemLocator;
use crate::store::ItemStore;
use reqwest::Client;
use std::time::Duration;

/// Outcome of probing a single index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The item was fetched and stored
    Downloaded {
        /// Size of the stored item in bytes
        bytes: u64,
    },

    /// The item was already on disk; no request was made
    Resumed,

    /// The source answered with a non-success status: the series ends
    /// before this index
    EndOfSeries {
        /// The HTTP status code
        status_code: u16,
    },
}

/// Builds an HTTP client with the configured timeouts and user agent
///
/// # Example
///
/// ```no_run
/// use page_harvest::config::SourceConfig;
/// use page_harvest::discovery::build_http_client;
///
/// let client = build_http_client(&SourceConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &SourceConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs one request per index and persists successful items
#[derive(Debug, Clone)]
pub struct Probe {
    client: Client,
    locator: ItemLocator,
    store: ItemStore,
}

impl Probe {
    pub fn new(client: Client, locator: ItemLocator, store: ItemStore) -> Self {
        Self {
            client,
            locator,
            store,
        }
    }

    pub fn locator(&self) -> &ItemLocator {
        &self.locator
    }

    /// Probes a single index
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Item already on disk | `Resumed`, no request |
    /// | 2xx response | body stored, `Downloaded` |
    /// | Any other status | `EndOfSeries`, nothing written |
    /// | Connection error, timeout, body read error | `Err(Transport)` |
    /// | Store failure | `Err(Store)` |
    ///
    /// Failures are not retried.
    pub async fn probe(&self, index: u64) -> Result<ProbeOutcome, DiscoveryError> {
        if self.store.has(index).await {
            return Ok(ProbeOutcome::Resumed);
        }

        let url = self.locator.item_url(index);
        let transport = |source: reqwest::Error| DiscoveryError::Transport {
            index,
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Ok(ProbeOutcome::EndOfSeries {
                status_code: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        let bytes = self.store.put(index, body.as_ref()).await?;

        Ok(ProbeOutcome::Downloaded { bytes })
    }
}
