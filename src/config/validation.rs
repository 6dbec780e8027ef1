use crate::config::types::{Config, DocumentConfig, DownloadConfig, SourceConfig};
use crate::ConfigError;
use std::path::{Component, Path};
use tokio::sync::Semaphore;
use url::Url;

/// Validates the entire configuration
///
/// Called after the file is parsed and again after command-line overrides
/// are applied.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_download_config(&config.download)?;
    validate_document_config(&config.document)?;
    Ok(())
}

/// Validates remote source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' cannot be used as a base",
            config.base_url
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates download stage configuration
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    validate_worker_count("download workers", config.workers)
}

/// Validates document assembly configuration
fn validate_document_config(config: &DocumentConfig) -> Result<(), ConfigError> {
    validate_worker_count("pdf workers", config.workers)?;

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be greater than 0, got {}",
            config.batch_size
        )));
    }

    validate_file_name(&config.output_name)?;

    Ok(())
}

/// Worker counts size a semaphore, so they are bounded by its permit limit
fn validate_worker_count(name: &str, workers: usize) -> Result<(), ConfigError> {
    if workers < 1 || workers > Semaphore::MAX_PERMITS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name,
            Semaphore::MAX_PERMITS,
            workers
        )));
    }

    Ok(())
}

/// The merged document must land directly inside the series directory
fn validate_file_name(name: &str) -> Result<(), ConfigError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "output-name must be a plain file name, got '{}'",
            name
        ))),
    }
}
