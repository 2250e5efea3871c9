//! Thread-safe aggregate statistics for a download run.
//!
//! Exactly one [`DownloadStats`] instance exists per run, shared by all
//! concurrent fetch tasks. Counters are atomic and the failed-filename list
//! is mutex-guarded, so no update is lost under true parallelism.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Aggregate statistics for one download run.
///
/// Invariant after a run that reached the fetch stage:
/// `downloaded_files() + skipped_files() + failed_count() == total_files()`.
#[derive(Debug, Default)]
pub struct DownloadStats {
    total_files: AtomicUsize,
    skipped_files: AtomicUsize,
    downloaded_files: AtomicUsize,
    total_bytes_downloaded: AtomicU64,
    failed_files: Mutex<Vec<String>>,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the listing result count. Set exactly once, after enumeration.
    pub fn set_total(&self, total: usize) {
        self.total_files.store(total, Ordering::SeqCst);
    }

    /// Records one file skipped because it already exists locally.
    pub fn record_skipped(&self) {
        self.skipped_files.fetch_add(1, Ordering::SeqCst);
    }

    /// Records one successful download and its transferred byte count.
    pub fn record_downloaded(&self, bytes: u64) {
        self.downloaded_files.fetch_add(1, Ordering::SeqCst);
        self.total_bytes_downloaded.fetch_add(bytes, Ordering::SeqCst);
    }

    /// Records one failed download by filename.
    pub fn record_failed(&self, filename: &str) {
        self.failed_files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(filename.to_string());
    }

    /// Returns the number of files the listing produced.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.total_files.load(Ordering::SeqCst)
    }

    /// Returns the number of files skipped because they already existed.
    #[must_use]
    pub fn skipped_files(&self) -> usize {
        self.skipped_files.load(Ordering::SeqCst)
    }

    /// Returns the number of files downloaded successfully.
    #[must_use]
    pub fn downloaded_files(&self) -> usize {
        self.downloaded_files.load(Ordering::SeqCst)
    }

    /// Returns the total bytes transferred by successful downloads.
    #[must_use]
    pub fn total_bytes_downloaded(&self) -> u64 {
        self.total_bytes_downloaded.load(Ordering::SeqCst)
    }

    /// Returns the filenames of failed downloads, in completion order.
    #[must_use]
    pub fn failed_files(&self) -> Vec<String> {
        self.failed_files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of failed downloads.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed_files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Copies all counters from another instance. Used only when the run's
    /// stats handle is unexpectedly still shared after all tasks joined.
    pub(crate) fn copy_counts_from(&self, other: &Self) {
        self.set_total(other.total_files());
        for _ in 0..other.skipped_files() {
            self.record_skipped();
        }
        let downloaded = other.downloaded_files();
        if downloaded > 0 {
            self.record_downloaded(other.total_bytes_downloaded());
            for _ in 1..downloaded {
                self.record_downloaded(0);
            }
        }
        for filename in other.failed_files() {
            self.record_failed(&filename);
        }
    }

    /// Renders the human-readable end-of-run summary, including the list of
    /// failed filenames so operators know exactly which files to retry.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut summary = format!(
            "Download summary:\n  \
             Total files found:     {}\n  \
             Files already present: {}\n  \
             Files downloaded:      {}\n  \
             Failed downloads:      {}\n  \
             Total data downloaded: {}",
            self.total_files(),
            self.skipped_files(),
            self.downloaded_files(),
            self.failed_count(),
            format_size(self.total_bytes_downloaded()),
        );

        let failed = self.failed_files();
        if !failed.is_empty() {
            summary.push_str("\nFailed downloads:");
            for filename in &failed {
                summary.push_str("\n  - ");
                summary.push_str(filename);
            }
        }

        summary
    }
}

/// Formats a byte count into a human-readable string (1024-based units).
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}
