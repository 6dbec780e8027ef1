//! Series identification module
//!
//! A series is addressed by a short opaque token. This module validates the
//! token and derives the remote location of every item in the series.

mod locator;

pub use locator::ItemLocator;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Required length of a series identifier, in bytes
pub const SERIES_ID_LEN: usize = 4;

/// Errors raised while validating a series identifier
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("series id must be exactly {SERIES_ID_LEN} bytes long, got '{0}'")]
    InvalidLength(String),

    #[error("series id '{0}' contains a character that is not allowed in a directory name")]
    InvalidCharacter(String),
}

/// Validated identifier of a remote page series
///
/// The identifier doubles as the name of the local series directory, so it
/// may not contain path separators or be a relative path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesId(String);

impl SeriesId {
    pub fn new(raw: &str) -> Result<Self, SeriesError> {
        if raw.len() != SERIES_ID_LEN {
            return Err(SeriesError::InvalidLength(raw.to_string()));
        }

        if raw
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control() || c.is_whitespace())
            || raw.chars().all(|c| c == '.')
        {
            return Err(SeriesError::InvalidCharacter(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SeriesId {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SeriesId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
