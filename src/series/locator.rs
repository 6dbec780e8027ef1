use crate::series::SeriesId;
use crate::ConfigError;
use url::Url;

/// Builds the remote URL of each item in a series
///
/// Items live at `<base>/<series>/files/large/<index>.png`.
#[derive(Debug, Clone)]
pub struct ItemLocator {
    base: Url,
    series: SeriesId,
}

impl ItemLocator {
    pub fn new(base_url: &str, series: SeriesId) -> Result<Self, ConfigError> {
        let base = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", base_url, e)))?;

        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(format!(
                "base-url '{}' cannot be used as a base",
                base_url
            )));
        }

        Ok(Self { base, series })
    }

    pub fn series(&self) -> &SeriesId {
        &self.series
    }

    /// Returns the URL for the 1-based item `index`
    pub fn item_url(&self, index: u64) -> Url {
        let mut url = self.base.clone();
        let file_name = format!("{}.png", index);
        // cannot_be_a_base was rejected in `new`
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                self.series.as_str(),
                "files",
                "large",
                file_name.as_str(),
            ]);
        }
        url
    }
}
