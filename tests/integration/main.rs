//! Integration tests for Page-Harvest
//!
//! These tests use wiremock to serve a page series and run the download and
//! document stages end-to-end against temporary directories.

mod discovery_tests;

use page_harvest::config::Config;
use page_harvest::document::{BackendError, DocumentBackend};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Encodes a small solid-colour PNG
pub fn png_bytes(shade: u8) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image::RgbImage::from_pixel(6, 8, image::Rgb([shade, 80, 160]))
        .write_to(&mut buffer, image::ImageFormat::Png)
        .expect("Failed to encode PNG");
    buffer.into_inner()
}

/// Creates a test configuration pointing at the mock server
pub fn create_test_config(base_url: &str, output_dir: &Path, workers: usize) -> Config {
    let mut config = Config::default();
    config.source.base_url = base_url.to_string();
    config.source.request_timeout_secs = 5;
    config.source.connect_timeout_secs = 2;
    config.download.workers = workers;
    config.document.workers = 2;
    config.output.directory = output_dir.to_path_buf();
    config
}

/// Path of a page on the mock server
pub fn page_path(series: &str, index: u64) -> String {
    format!("/{}/files/large/{}.png", series, index)
}

/// Serves pages `1..=len` with the given per-page delay; everything else is 404
pub async fn mount_series<F>(server: &MockServer, series: &str, len: u64, delay: F)
where
    F: Fn(u64) -> Duration,
{
    for index in 1..=len {
        Mock::given(method("GET"))
            .and(path(page_path(series, index)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(png_bytes(index as u8))
                    .set_delay(delay(index)),
            )
            .with_priority(1)
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path_regex(r"^/.+/files/large/\d+\.png$"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Page indices requested from the mock server
pub async fn requested_pages(server: &MockServer) -> Vec<u64> {
    let requests: Vec<Request> = server.received_requests().await.unwrap_or_default();
    let mut pages: Vec<u64> = requests
        .iter()
        .filter_map(|request| {
            request
                .url
                .path_segments()?
                .last()?
                .strip_suffix(".png")?
                .parse()
                .ok()
        })
        .collect();
    pages.sort_unstable();
    pages
}

/// Document backend that records its calls instead of building PDFs
///
/// Conversions of low ordinals are slowed down so batches finish out of
/// submission order.
#[derive(Default)]
pub struct RecordingBackend {
    pub converted: Mutex<Vec<(PathBuf, Vec<PathBuf>)>>,
    pub merged: Mutex<Vec<PathBuf>>,
    pub merge_output: Mutex<Option<PathBuf>>,
    pub fail_merge: bool,
}

impl DocumentBackend for RecordingBackend {
    fn convert(&self, images: &[PathBuf], output: &Path) -> Result<(), BackendError> {
        let ordinal: u64 = output
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse().ok())
            .unwrap_or(0);
        std::thread::sleep(Duration::from_millis(60u64.saturating_sub(ordinal * 25)));

        std::fs::write(output, b"%PDF-stub")?;
        self.converted
            .lock()
            .unwrap()
            .push((output.to_path_buf(), images.to_vec()));
        Ok(())
    }

    fn merge(&self, parts: &[PathBuf], output: &Path) -> Result<(), BackendError> {
        for part in parts {
            if !part.exists() {
                return Err(format!("missing part {}", part.display()).into());
            }
        }
        self.merged.lock().unwrap().extend_from_slice(parts);
        if self.fail_merge {
            return Err("merge exploded".into());
        }
        std::fs::write(output, b"%PDF-merged")?;
        *self.merge_output.lock().unwrap() = Some(output.to_path_buf());
        Ok(())
    }
}

/// Lists entries of `dir` whose name starts with the scratch prefix
pub fn scratch_dirs(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .map(|name| name.to_string_lossy().starts_with("pdfgen"))
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default()
}
