//! Discovery coordinator - downloads a series of unknown length
//!
//! Workers claim indices from a shared cursor and probe them in parallel,
//! bounded by a semaphore. The first end-of-series response stops further
//! claims; the coordinator then waits for every probe already in flight to
//! settle before computing the number of valid items.

use crate::discovery::probe::{Probe, ProbeOutcome};
use crate::discovery::state::{lock_state, SeriesState};
use crate::discovery::DiscoveryError;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Result of a completed discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Contiguous confirmed item count starting at 1
    pub count: u64,

    /// Items fetched over the network during this run
    pub downloaded: u64,

    /// Items already present on disk
    pub resumed: u64,

    /// Indices that succeeded beyond the end of the series; their files may
    /// exist but they are not part of the series
    pub spurious: Vec<u64>,

    /// Total number of indices probed
    pub probed: u64,
}

/// Drives a bounded pool of probes over an open-ended index range
pub struct Coordinator {
    probe: Arc<Probe>,
    workers: usize,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `probe` - The probe used for every index
    /// * `workers` - Maximum number of probes in flight; clamped to
    ///   `1..=Semaphore::MAX_PERMITS`
    pub fn new(probe: Probe, workers: usize) -> Self {
        Self {
            probe: Arc::new(probe),
            workers: workers.clamp(1, Semaphore::MAX_PERMITS),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses an external token so a caller can stop the download early
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the download until the end of the series is found
    ///
    /// # Returns
    ///
    /// * `Ok(DiscoveryReport)` - Every claimed index has settled
    /// * `Err(DiscoveryError)` - The first fatal error; items already written
    ///   stay on disk
    pub async fn run(&self) -> Result<DiscoveryReport, DiscoveryError> {
        let series = self.probe.locator().series().clone();
        let state = Arc::new(Mutex::new(SeriesState::new()));
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks: JoinSet<Result<(), DiscoveryError>> = JoinSet::new();

        tracing::info!("Number of workers: {}", self.workers);

        loop {
            let permit = tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let Some(index) = lock_state(&state).claim() else {
                tracing::debug!("End of series reached, draining workers");
                break;
            };

            let probe = Arc::clone(&self.probe);
            let state = Arc::clone(&state);
            let cancel = self.cancel.clone();
            let series = series.clone();

            tasks.spawn(async move {
                // Held until the outcome is recorded
                let _permit = permit;

                let outcome = tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        tracing::debug!("Probe for page {} cancelled", index);
                        return Ok(());
                    }

                    outcome = probe.probe(index) => outcome,
                };

                match outcome {
                    Ok(ProbeOutcome::EndOfSeries { status_code }) => {
                        if lock_state(&state).mark_end(index) {
                            tracing::info!(
                                "End of series [series:{}] at page {} (status {})",
                                series,
                                index,
                                status_code
                            );
                        }
                        Ok(())
                    }
                    Ok(ProbeOutcome::Resumed) => {
                        lock_state(&state).record_success(index, true);
                        tracing::debug!("Already on disk [series:{}][page:{}]", series, index);
                        Ok(())
                    }
                    Ok(ProbeOutcome::Downloaded { bytes }) => {
                        lock_state(&state).record_success(index, false);
                        tracing::info!(
                            "Downloaded [series:{}][page:{}] ({} bytes)",
                            series,
                            index,
                            bytes
                        );
                        Ok(())
                    }
                    Err(e) => {
                        tracing::error!("Page {} failed: {}", index, e);
                        cancel.cancel();
                        Err(e)
                    }
                }
            });
        }

        // Wait for every claimed index to settle
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| DiscoveryError::TaskFailed(e.to_string()));
            if let Err(e) = result.and_then(|r| r) {
                self.cancel.cancel();
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let state = lock_state(&state);
        if !state.is_terminated() {
            return Err(DiscoveryError::Cancelled);
        }

        let report = DiscoveryReport {
            count: state.contiguous_count(),
            downloaded: state.downloaded(),
            resumed: state.resumed(),
            spurious: state.spurious(),
            probed: state.claimed(),
        };

        if !report.spurious.is_empty() {
            tracing::warn!(
                "Ignoring {} page(s) beyond the end of series {}: {:?}",
                report.spurious.len(),
                series,
                report.spurious
            );
        }

        tracing::info!("Found {} pages for series {}", report.count, series);

        Ok(report)
    }
}
