//! Download orchestration: listing, bounded-concurrency fetching, and
//! aggregate reporting.
//!
//! Data flows one way: the orchestrator asks the [`lister`] for file
//! descriptors, feeds each descriptor to the [`engine`], the engine runs
//! [`fetcher`] tasks bounded by the concurrency limit, and each task
//! records its outcome in the shared [`DownloadStats`].
//!
//! # Example
//!
//! ```no_run
//! use knmi_dl::download::{RunConfig, run};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::new("my-api-key", "Actuele10mindataKNMIstations", "2");
//! let stats = run(config).await?;
//! println!("{}", stats.render_summary());
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod fetcher;
pub mod lister;
pub mod stats;

pub use engine::{DownloadEngine, EngineError};
pub use fetcher::{FetchError, FetchOutcome, fetch_file};
pub use lister::list_all;
pub use stats::{DownloadStats, format_size};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::api::models::{ListingFilter, OrderBy, SortOrder};
use crate::api::{ApiError, DatasetApi, OpenDataClient};
use crate::defaults::{DEFAULT_MAX_CONCURRENT, DEFAULT_OUTPUT_DIR, OPEN_DATA_BASE_URL};

/// Error type for a whole download run.
///
/// These are the fatal categories: they unwind out of [`run`] entirely and
/// no stats object is produced. Per-file failures never surface here; they
/// are recorded in [`DownloadStats`].
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Scheduler construction failed (invalid concurrency).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Listing the remote files failed; the fetch stage was never reached.
    #[error("listing failed: {0}")]
    Listing(#[from] ApiError),
}

/// Configuration for one download run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// API key sent with every listing and download-URL request.
    pub api_key: String,
    /// Base URL of the Open Data platform API.
    pub base_url: String,
    /// Dataset to download.
    pub dataset_name: String,
    /// Dataset version to download.
    pub version: String,
    /// Maximum number of concurrent downloads (1-100).
    pub concurrency: usize,
    /// Directory downloaded files are placed under.
    pub output_dir: PathBuf,
    /// Inclusive start of the listing window.
    pub start_date: Option<DateTime<Utc>>,
    /// Exclusive end of the listing window.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum number of files to download.
    pub limit: Option<usize>,
    /// Token that aborts in-flight transfers when cancelled.
    pub cancel: CancellationToken,
    /// Whether to render the overall progress bar.
    pub show_progress: bool,
}

impl RunConfig {
    /// Creates a config with library defaults: platform base URL, default
    /// concurrency, `./datasets` output, unbounded window, no limit.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        dataset_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPEN_DATA_BASE_URL.to_string(),
            dataset_name: dataset_name.into(),
            version: version.into(),
            concurrency: DEFAULT_MAX_CONCURRENT,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            start_date: None,
            end_date: None,
            limit: None,
            cancel: CancellationToken::new(),
            show_progress: false,
        }
    }
}

/// Immutable state shared read-only by every fetch task in one run.
///
/// Created once per run and dropped when the run returns, releasing the
/// shared HTTP connection pool on every exit path.
pub struct DownloadContext {
    /// Binding layer for listing and download-URL calls.
    pub api: Arc<dyn DatasetApi>,
    /// Shared client for HEAD probes and content transfers.
    pub http: reqwest::Client,
    /// Dataset being downloaded.
    pub dataset_name: String,
    /// Dataset version being downloaded.
    pub version: String,
    /// Directory downloaded files are placed under.
    pub output_dir: PathBuf,
    /// Cancellation signal observed between chunks.
    pub cancel: CancellationToken,
}

/// Downloads all dataset files matching the configured window.
///
/// Builds an [`OpenDataClient`] against the configured base URL and
/// delegates to [`run_with_api`].
///
/// # Errors
///
/// Returns [`RunError`] when the concurrency limit is invalid or the
/// listing stage fails. Per-file failures are reported through the
/// returned [`DownloadStats`] instead.
pub async fn run(config: RunConfig) -> Result<DownloadStats, RunError> {
    let http = reqwest::Client::new();
    let api: Arc<dyn DatasetApi> = Arc::new(OpenDataClient::new(
        http.clone(),
        &config.base_url,
        &config.api_key,
    ));
    run_with_api(config, api, http).await
}

/// Downloads all dataset files using the given binding layer.
///
/// Exposed separately so integration tests can substitute a test double
/// for the remote API.
///
/// # Errors
///
/// Returns [`RunError`] when the concurrency limit is invalid or the
/// listing stage fails.
#[instrument(skip_all, fields(dataset = %config.dataset_name, version = %config.version))]
pub async fn run_with_api(
    config: RunConfig,
    api: Arc<dyn DatasetApi>,
    http: reqwest::Client,
) -> Result<DownloadStats, RunError> {
    let engine = DownloadEngine::new(config.concurrency)?;

    let filter = ListingFilter {
        dataset_name: config.dataset_name.clone(),
        version: config.version.clone(),
        begin: config.start_date,
        end: config.end_date,
        order_by: OrderBy::LastModified,
        sorting: SortOrder::Desc,
        max_keys: config
            .limit
            .map(|limit| u32::try_from(limit).unwrap_or(u32::MAX)),
    };

    let files = list_all(api.as_ref(), &filter, config.limit).await?;

    let stats = Arc::new(DownloadStats::new());
    stats.set_total(files.len());
    info!(
        total = files.len(),
        start = ?config.start_date,
        end = ?config.end_date,
        "listing complete"
    );

    let ctx = Arc::new(DownloadContext {
        api,
        http,
        dataset_name: config.dataset_name,
        version: config.version,
        output_dir: config.output_dir,
        cancel: config.cancel,
    });

    let bar = crate::progress::overall_bar(files.len() as u64, config.show_progress);

    let task_stats = Arc::clone(&stats);
    let task_bar = bar.clone();
    engine
        .run(files, move |file| {
            let ctx = Arc::clone(&ctx);
            let stats = Arc::clone(&task_stats);
            let bar = task_bar.clone();
            async move {
                match fetch_file(&ctx, &file).await {
                    Ok(FetchOutcome::Downloaded { bytes }) => stats.record_downloaded(bytes),
                    Ok(FetchOutcome::Skipped) => stats.record_skipped(),
                    Err(error) => {
                        warn!(filename = %file.filename, error = %error, "download failed");
                        stats.record_failed(&file.filename);
                    }
                }
                bar.inc(1);
            }
        })
        .await?;

    bar.finish_and_clear();

    info!(
        total = stats.total_files(),
        downloaded = stats.downloaded_files(),
        skipped = stats.skipped_files(),
        failed = stats.failed_count(),
        bytes = stats.total_bytes_downloaded(),
        "download run complete"
    );

    // All tasks are joined, so this should be the sole reference. If not,
    // rebuild the aggregate from the shared instance.
    match Arc::try_unwrap(stats) {
        Ok(stats) => Ok(stats),
        Err(shared) => {
            let rebuilt = DownloadStats::new();
            rebuilt.copy_counts_from(&shared);
            Ok(rebuilt)
        }
    }
}
