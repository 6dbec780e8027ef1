//! Run summary reporting
//!
//! Collects what a run did and prints it for the user once the run ends.

use crate::series::SeriesId;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The series that was downloaded
    pub series: SeriesId,

    /// Directory holding the series items
    pub series_dir: PathBuf,

    /// Contiguous number of items in the series
    pub items_found: u64,

    /// Items fetched over the network during this run
    pub items_downloaded: u64,

    /// Items reused from an earlier run
    pub items_resumed: u64,

    /// Indices found beyond the end of the series and left out
    pub spurious_items: Vec<u64>,

    /// Merged document, if one was built
    pub artifact: Option<PathBuf>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Page-Harvest Summary ===\n");
    println!("Series: {}", summary.series);
    println!("Directory: {}", summary.series_dir.display());
    println!("Started: {}", summary.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Elapsed: {:.2}s", summary.elapsed.as_secs_f64());
    println!();
    println!("Pages found: {}", summary.items_found);
    println!("  Downloaded: {}", summary.items_downloaded);
    println!("  Already on disk: {}", summary.items_resumed);

    if !summary.spurious_items.is_empty() {
        println!(
            "  Ignored beyond end of series: {}",
            summary.spurious_items.len()
        );
    }

    match &summary.artifact {
        Some(path) => println!("\n✓ Generated pdf at: {}", path.display()),
        None => println!("\n✓ Saved {} pages, no pdf generated", summary.items_found),
    }
}
