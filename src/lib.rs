//! Page-Harvest: a sequential page series downloader
//!
//! This crate fetches numbered page images for a series until the remote
//! source stops answering, stores them on disk, and optionally assembles
//! them into a single PDF document.

pub mod config;
pub mod discovery;
pub mod document;
pub mod pipeline;
pub mod series;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Page-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid series identifier: {0}")]
    Series(#[from] series::SeriesError),

    #[error("Failed to create directory {path}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Download failed: {0}")]
    Discovery(#[from] discovery::DiscoveryError),

    #[error("Document assembly failed: {0}")]
    Document(#[from] document::DocumentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Page-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{run_series, RunSummary};
pub use series::SeriesId;
