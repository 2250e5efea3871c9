//! Single-file fetch: existence skip, URL resolution, streamed transfer,
//! cleanup on failure.
//!
//! A fetch is idempotent at the file level: when the local path already
//! exists the file is skipped, which is the resumability mechanism for
//! re-running the same window over a partially populated directory. Any
//! failure after the skip check removes the partial file so a truncated
//! download is never left on disk.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};

use super::DownloadContext;
use crate::api::ApiError;
use crate::api::models::FileSummary;

/// Errors that can occur while fetching one file.
///
/// All of these are per-file: they are converted into a stats update at the
/// scheduler boundary and never abort sibling fetches.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The download-URL request failed.
    #[error("failed to resolve download URL for {filename}: {source}")]
    DownloadUrl {
        /// The file whose URL request failed.
        filename: String,
        /// The underlying API error.
        #[source]
        source: ApiError,
    },

    /// The API responded without a temporary download URL.
    #[error("no download URL returned for {filename}")]
    MissingDownloadUrl {
        /// The file the API returned no URL for.
        filename: String,
    },

    /// Network-level error during the transfer.
    #[error("network error transferring {filename}: {source}")]
    Network {
        /// The file whose transfer failed.
        filename: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status from the content URL.
    #[error("HTTP {status} transferring {filename}")]
    HttpStatus {
        /// The file whose transfer failed.
        filename: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error (directory creation, file create, write).
    #[error("IO error writing {path}: {source}")]
    Io {
        /// The local path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled while this file was pending or in flight.
    #[error("transfer of {filename} cancelled")]
    Cancelled {
        /// The file whose transfer was cancelled.
        filename: String,
    },
}

impl FetchError {
    /// Creates a download-URL error.
    pub fn download_url(filename: impl Into<String>, source: ApiError) -> Self {
        Self::DownloadUrl {
            filename: filename.into(),
            source,
        }
    }

    /// Creates a missing-download-URL error.
    pub fn missing_download_url(filename: impl Into<String>) -> Self {
        Self::MissingDownloadUrl {
            filename: filename.into(),
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(filename: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            filename: filename.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(filename: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            filename: filename.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(filename: impl Into<String>) -> Self {
        Self::Cancelled {
            filename: filename.into(),
        }
    }
}

/// Terminal state of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The file was transferred; `bytes` were written to disk.
    Downloaded {
        /// Bytes written to the local file.
        bytes: u64,
    },
    /// The local path already existed; nothing was transferred.
    Skipped,
}

/// Fetches one file into the context's output directory.
///
/// Steps: resolve the local path and create parent directories, skip if the
/// path exists, resolve the temporary download URL, probe the expected size
/// (header only; absence tolerated), then stream the body to disk in
/// chunks. On any failure after the skip check the partial file is removed
/// before the error is returned.
///
/// # Errors
///
/// Returns [`FetchError`] for this file only; callers convert it into a
/// recorded failure rather than propagating it across tasks.
#[instrument(level = "debug", skip(ctx, file), fields(filename = %file.filename))]
pub async fn fetch_file(
    ctx: &DownloadContext,
    file: &FileSummary,
) -> Result<FetchOutcome, FetchError> {
    if ctx.cancel.is_cancelled() {
        return Err(FetchError::cancelled(&file.filename));
    }

    let output_path = ctx.output_dir.join(&file.filename);
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::io(parent, e))?;
    }

    // Existence check is the resume mechanism: no content verification
    if tokio::fs::metadata(&output_path).await.is_ok() {
        debug!(path = %output_path.display(), "file already present, skipping");
        return Ok(FetchOutcome::Skipped);
    }

    match transfer(ctx, file, &output_path).await {
        Ok(bytes) => {
            debug!(
                path = %output_path.display(),
                bytes,
                "download completed"
            );
            Ok(FetchOutcome::Downloaded { bytes })
        }
        Err(error) => {
            remove_partial_file(&output_path).await;
            Err(error)
        }
    }
}

/// Resolves the temporary URL and streams the content to `output_path`.
async fn transfer(
    ctx: &DownloadContext,
    file: &FileSummary,
    output_path: &Path,
) -> Result<u64, FetchError> {
    let download = ctx
        .api
        .download_url(&ctx.dataset_name, &ctx.version, &file.filename)
        .await
        .map_err(|e| FetchError::download_url(&file.filename, e))?;

    let url = download
        .temporary_download_url
        .ok_or_else(|| FetchError::missing_download_url(&file.filename))?;

    let expected_bytes = probe_content_length(ctx, &file.filename, &url).await?;
    debug!(expected_bytes, "starting transfer");

    let response = ctx
        .http
        .get(&url)
        .send()
        .await
        .map_err(|e| FetchError::network(&file.filename, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::http_status(&file.filename, status.as_u16()));
    }

    let out = File::create(output_path)
        .await
        .map_err(|e| FetchError::io(output_path, e))?;
    let mut writer = BufWriter::new(out);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        if ctx.cancel.is_cancelled() {
            return Err(FetchError::cancelled(&file.filename));
        }

        let chunk = chunk_result.map_err(|e| FetchError::network(&file.filename, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(output_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(output_path, e))?;

    Ok(bytes_written)
}

/// Issues a header-only request to learn the expected size.
///
/// A response without a Content-Length header (or with a non-success
/// status) yields zero; only a transport failure is an error.
async fn probe_content_length(
    ctx: &DownloadContext,
    filename: &str,
    url: &str,
) -> Result<u64, FetchError> {
    let response = ctx
        .http
        .head(url)
        .send()
        .await
        .map_err(|e| FetchError::network(filename, e))?;

    Ok(response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0))
}

/// Removes a partially written file, logging (not propagating) any error.
async fn remove_partial_file(path: &Path) {
    if tokio::fs::metadata(path).await.is_ok() {
        if let Err(error) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %error, "failed to remove partial file");
        } else {
            debug!(path = %path.display(), "removed partial file");
        }
    }
}
