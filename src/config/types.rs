use serde::Deserialize;
use std::path::PathBuf;

/// Default remote location that hosts the page series
pub const DEFAULT_BASE_URL: &str = "https://majalahsekolah.com/books";

/// Main configuration structure for Page-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub download: DownloadConfig,
    pub document: DocumentConfig,
    pub output: OutputConfig,
}

/// Remote source configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL; items live at `<base-url>/<series>/files/large/<index>.png`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Total time allowed for a single request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Time allowed to establish a connection (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("page-harvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Download stage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Maximum number of probes in flight
    pub workers: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: available_workers(),
        }
    }
}

/// Document assembly configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Whether to build a PDF once the download finishes
    pub enabled: bool,

    /// Number of pages converted together into one intermediate PDF
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Maximum number of batches converted concurrently
    pub workers: usize,

    /// File name of the merged document inside the series directory
    #[serde(rename = "output-name")]
    pub output_name: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 25,
            workers: available_workers(),
            output_name: "output.pdf".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory under which one folder per series is created
    pub directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

/// Number of parallel execution units, falling back to 1 when unknown
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
