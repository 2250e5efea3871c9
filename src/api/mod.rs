//! Abstract binding layer for the Open Data platform API.
//!
//! The download core depends on exactly two remote operations: listing one
//! page of file descriptors and resolving a time-limited download URL for a
//! named file. Both are expressed by the [`DatasetApi`] trait so the HTTP
//! implementation ([`OpenDataClient`]) can be swapped for a test double.

pub mod client;
pub mod models;

pub use client::OpenDataClient;
pub use models::{
    FileDownload, FileSummary, ListFilesResponse, ListingFilter, OrderBy, SortOrder,
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while calling the listing API.
///
/// Any of these is fatal to a listing run: a page that cannot be fetched or
/// parsed aborts enumeration without retrying.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error calling {url}: {source}")]
    Network {
        /// The endpoint that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} from {url}")]
    Status {
        /// The endpoint that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Response body was missing or not valid JSON for the expected model.
    #[error("invalid response body from {url}: {source}")]
    Decode {
        /// The endpoint whose body failed to decode.
        url: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error from a reqwest error.
    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}

/// Remote operations the download core depends on.
///
/// Implementations must be safe to share across concurrent fetch tasks.
#[async_trait]
pub trait DatasetApi: Send + Sync {
    /// Fetches one page of the file listing.
    ///
    /// The first page is requested with `page_token = None`; subsequent
    /// pages pass the `next_page_token` of the previous response. All other
    /// filter fields stay unchanged across pages.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails, the server returns a
    /// non-success status, or the body cannot be decoded.
    async fn list_page(
        &self,
        filter: &ListingFilter,
        page_token: Option<&str>,
    ) -> Result<ListFilesResponse, ApiError>;

    /// Resolves a time-limited download URL for one file.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails, the server returns a
    /// non-success status, or the body cannot be decoded. A successful
    /// response with no `temporaryDownloadUrl` is not an error at this
    /// layer; the fetcher treats it as a per-file failure.
    async fn download_url(
        &self,
        dataset_name: &str,
        version: &str,
        filename: &str,
    ) -> Result<FileDownload, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_display() {
        let error = ApiError::status("https://example.com/v1/files", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected '503' in: {msg}");
        assert!(
            msg.contains("https://example.com/v1/files"),
            "Expected URL in: {msg}"
        );
    }
}
