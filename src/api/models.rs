//! Data models for the Open Data platform listing API.
//!
//! Response types mirror the JSON the platform returns (camelCase fields);
//! unknown or absent fields degrade to defaults rather than failing the
//! whole page. Timestamps are kept as the API's ISO-8601 strings because
//! the downloader never interprets them, only reports them.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Metadata for one remote file, without its content.
///
/// Uniquely identified by `filename` within one listing window.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    /// Remote object name; also the local filename under the output root.
    pub filename: String,
    /// Size in bytes, when the API reports it.
    #[serde(default)]
    pub size: Option<u64>,
    /// Creation timestamp as reported by the API.
    #[serde(default)]
    pub created: Option<String>,
    /// Last-modification timestamp as reported by the API.
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// One page of a paginated file listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesResponse {
    /// Files on this page, in the order the API returned them.
    #[serde(default)]
    pub files: Vec<FileSummary>,
    /// Whether further pages exist.
    #[serde(default)]
    pub is_truncated: bool,
    /// Page size the server applied.
    #[serde(default)]
    pub max_results: Option<u64>,
    /// Opaque cursor for the next page, present when `is_truncated`.
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Number of results on this page.
    #[serde(default)]
    pub result_count: Option<u64>,
    /// Filename this page starts after.
    #[serde(default)]
    pub start_after_filename: Option<String>,
}

/// Response of the per-file download-URL endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDownload {
    /// MIME type of the file content.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Last-modification timestamp as reported by the API.
    #[serde(default)]
    pub last_modified: Option<String>,
    /// Size as reported by the API (a string on the wire).
    #[serde(default)]
    pub size: Option<String>,
    /// Time-limited pre-signed URL for the file content.
    #[serde(default)]
    pub temporary_download_url: Option<String>,
}

/// Field the listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Filename,
    Created,
    LastModified,
}

impl OrderBy {
    /// Wire value for the `orderBy` query parameter.
    #[must_use]
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Created => "created",
            Self::LastModified => "lastModified",
        }
    }
}

/// Sort direction of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Wire value for the `sorting` query parameter.
    #[must_use]
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Immutable request configuration for one listing run.
///
/// Owned by the orchestrator and passed by reference into the pagination
/// loop; only the page token varies between page requests.
#[derive(Debug, Clone)]
pub struct ListingFilter {
    /// Dataset to list.
    pub dataset_name: String,
    /// Dataset version to list.
    pub version: String,
    /// Inclusive start of the time window.
    pub begin: Option<DateTime<Utc>>,
    /// Exclusive end of the time window.
    pub end: Option<DateTime<Utc>>,
    /// Field the listing is ordered by.
    pub order_by: OrderBy,
    /// Sort direction.
    pub sorting: SortOrder,
    /// Page size hint (`maxKeys`); the server may apply its own cap.
    pub max_keys: Option<u32>,
}

impl ListingFilter {
    /// Creates a filter with the platform's default ordering:
    /// most-recently-modified first.
    #[must_use]
    pub fn new(dataset_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            version: version.into(),
            begin: None,
            end: None,
            order_by: OrderBy::LastModified,
            sorting: SortOrder::Desc,
            max_keys: None,
        }
    }
}

/// Formats a timestamp the way the listing API expects it: ISO-8601 with
/// an explicit UTC offset, e.g. `2024-01-01T00:00:00+00:00`.
#[must_use]
pub fn wire_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}
