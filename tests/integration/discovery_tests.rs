//! Download stage tests against a mock page source

use crate::{mount_series, page_path, png_bytes, requested_pages};
use page_harvest::config::SourceConfig;
use page_harvest::discovery::{build_http_client, Coordinator, DiscoveryError, Probe};
use page_harvest::series::{ItemLocator, SeriesId};
use page_harvest::store::ItemStore;
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_coordinator(base_url: &str, dir: &Path, workers: usize) -> Coordinator {
    let client = build_http_client(&SourceConfig::default()).expect("Failed to build client");
    let locator = ItemLocator::new(base_url, SeriesId::new("0001").unwrap()).unwrap();
    let probe = Probe::new(client, locator, ItemStore::new(dir));
    Coordinator::new(probe, workers)
}

/// Pseudo-random latency so completions arrive out of order
fn jitter(index: u64) -> Duration {
    Duration::from_millis((index * 37 % 11) * 5)
}

#[tokio::test]
async fn test_discovers_exact_length_for_any_worker_count() {
    for workers in [1, 2, 8] {
        let server = MockServer::start().await;
        mount_series(&server, "0001", 12, jitter).await;

        let dir = TempDir::new().unwrap();
        let report = create_coordinator(&server.uri(), dir.path(), workers)
            .run()
            .await
            .expect("Download failed");

        assert_eq!(report.count, 12, "workers = {}", workers);
        assert_eq!(report.downloaded, 12);
        assert_eq!(report.resumed, 0);
        assert!(report.spurious.is_empty());

        for index in 1..=12 {
            let content = std::fs::read(dir.path().join(format!("{}.png", index))).unwrap();
            assert_eq!(content, png_bytes(index as u8));
        }
        assert!(!dir.path().join("13.png").exists());
        assert!(report.probed >= 13);
    }
}

#[tokio::test]
async fn test_single_worker_probes_one_past_the_end() {
    let server = MockServer::start().await;
    mount_series(&server, "0001", 4, |_| Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    let report = create_coordinator(&server.uri(), dir.path(), 1)
        .run()
        .await
        .unwrap();

    assert_eq!(report.count, 4);
    assert_eq!(report.probed, 5);
    assert_eq!(requested_pages(&server).await, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_successes_beyond_end_are_excluded() {
    let server = MockServer::start().await;

    // Pages 1-3 are slow, page 4 answers 404 quickly, and every later page
    // succeeds instantly, so they complete before the end is known.
    for index in 1..=3 {
        Mock::given(method("GET"))
            .and(path(page_path("0001", index)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(png_bytes(1))
                    .set_delay(Duration::from_millis(150)),
            )
            .with_priority(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(page_path("0001", 4)))
        .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(40)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/0001/files/large/\d+\.png$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(9)))
        .with_priority(10)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = create_coordinator(&server.uri(), dir.path(), 8)
        .run()
        .await
        .unwrap();

    assert_eq!(report.count, 3);
    assert!(report.spurious.contains(&5));
    assert!(report.spurious.iter().all(|&index| index > 4));
    // The spurious page was written, it is just not part of the series
    assert!(dir.path().join("5.png").exists());
    assert!(!dir.path().join("4.png").exists());
}

#[tokio::test]
async fn test_resume_skips_pages_on_disk() {
    let server = MockServer::start().await;
    mount_series(&server, "0001", 6, |_| Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    for index in 1..=3 {
        std::fs::write(dir.path().join(format!("{}.png", index)), png_bytes(0)).unwrap();
    }

    let report = create_coordinator(&server.uri(), dir.path(), 2)
        .run()
        .await
        .unwrap();

    assert_eq!(report.count, 6);
    assert_eq!(report.resumed, 3);
    assert_eq!(report.downloaded, 3);

    let requested = requested_pages(&server).await;
    assert!(requested.iter().all(|&index| index > 3), "requested {:?}", requested);
    assert!(requested.contains(&7));

    // Existing pages are left untouched
    assert_eq!(std::fs::read(dir.path().join("1.png")).unwrap(), png_bytes(0));
}

#[tokio::test]
async fn test_fully_downloaded_series_only_probes_the_end() {
    let server = MockServer::start().await;
    mount_series(&server, "0001", 3, |_| Duration::ZERO).await;

    let dir = TempDir::new().unwrap();
    for index in 1..=3 {
        std::fs::write(dir.path().join(format!("{}.png", index)), png_bytes(0)).unwrap();
    }

    let report = create_coordinator(&server.uri(), dir.path(), 1)
        .run()
        .await
        .unwrap();

    assert_eq!(report.count, 3);
    assert_eq!(report.downloaded, 0);
    assert_eq!(requested_pages(&server).await, vec![4]);
}

#[tokio::test]
async fn test_server_error_ends_the_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path("0001", 1)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(1)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(10)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let report = create_coordinator(&server.uri(), dir.path(), 3)
        .run()
        .await
        .unwrap();

    assert_eq!(report.count, 1);
}

#[tokio::test]
async fn test_transport_error_is_fatal() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let result = create_coordinator(&format!("http://{}", addr), dir.path(), 4)
        .run()
        .await;

    assert!(matches!(result, Err(DiscoveryError::Transport { .. })));
}

#[tokio::test]
async fn test_timeout_is_fatal_and_keeps_saved_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(page_path("0001", 1)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(1)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(page_path("0001", 2)))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(10)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let source = SourceConfig {
        request_timeout_secs: 1,
        ..SourceConfig::default()
    };
    let client = build_http_client(&source).unwrap();
    let locator = ItemLocator::new(&server.uri(), SeriesId::new("0001").unwrap()).unwrap();
    let probe = Probe::new(client, locator, ItemStore::new(dir.path()));

    let result = Coordinator::new(probe, 1).run().await;

    match result {
        Err(DiscoveryError::Transport { index, .. }) => assert_eq!(index, 2),
        other => panic!("expected transport error, got {:?}", other),
    }
    assert!(dir.path().join("1.png").exists());
    assert!(!dir.path().join("2.png").exists());
}

/// Serves a malformed response for page 2 after a short delay and never
/// answers any other page
async fn spawn_stalling_source() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = String::from_utf8_lossy(&request);
                if head.starts_with(&format!("GET {} ", page_path("0001", 2))) {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    let _ = socket.write_all(b"garbage\r\n\r\n").await;
                    let _ = socket.shutdown().await;
                } else {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
            });
        }
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_transport_error_cancels_pending_pages() {
    let base_url = spawn_stalling_source().await;
    let dir = TempDir::new().unwrap();

    let start = Instant::now();
    let result = create_coordinator(&base_url, dir.path(), 3).run().await;
    let elapsed = start.elapsed();

    match result {
        Err(DiscoveryError::Transport { index, .. }) => assert_eq!(index, 2),
        other => panic!("expected transport error, got {:?}", other),
    }
    // Pages 1 and 3 are still waiting on the source when page 2 fails
    assert!(elapsed < Duration::from_secs(10), "took {:?}", elapsed);
    assert!(!dir.path().join("1.png").exists());
    assert!(!dir.path().join("3.png").exists());
}
