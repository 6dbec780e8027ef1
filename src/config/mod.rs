//! Configuration module for Page-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so running without a file is the common case.
//!
//! # Example
//!
//! ```no_run
//! use page_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Batch size: {}", config.document.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    available_workers, Config, DocumentConfig, DownloadConfig, OutputConfig, SourceConfig,
    DEFAULT_BASE_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
