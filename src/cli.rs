//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Parser;

use knmi_dl::defaults::{
    DEFAULT_DATASET_NAME, DEFAULT_DATASET_VERSION, DEFAULT_MAX_CONCURRENT, DEFAULT_OUTPUT_DIR,
};

/// Bulk download KNMI Open Data platform dataset files.
///
/// Lists the files a dataset version published inside a time window and
/// mirrors them into a local directory, skipping files that are already
/// present.
#[derive(Parser, Debug)]
#[command(name = "knmi-dl")]
#[command(author, version, about)]
pub struct Args {
    /// Name of the dataset to download
    #[arg(short = 'd', long, default_value = DEFAULT_DATASET_NAME)]
    pub dataset: String,

    /// Version of the dataset
    #[arg(long, default_value = DEFAULT_DATASET_VERSION)]
    pub dataset_version: String,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_MAX_CONCURRENT as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Start of the listing window, ISO 8601 (default: 90 minutes ago)
    #[arg(short = 's', long, value_parser = parse_datetime)]
    pub start_date: Option<DateTime<Utc>>,

    /// End of the listing window, ISO 8601 (default: now)
    #[arg(short = 'e', long, value_parser = parse_datetime)]
    pub end_date: Option<DateTime<Utc>>,

    /// KNMI API key (an anonymous key is fetched from the developer portal when omitted)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Output directory for downloaded files
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Maximum number of files to download
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parses an ISO 8601 date or datetime; naive values are treated as UTC.
fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!(
        "'{value}' is not ISO 8601 (e.g. 2024-01-01T00:00:00 or 2024-01-01)"
    ))
}
