//! Paginated enumeration of remote file descriptors.
//!
//! Walks the listing API's continuation-token protocol to produce the full
//! (optionally capped) set of descriptors for a time window. Any page-level
//! failure aborts enumeration; an empty result set is a valid outcome.

use tracing::{debug, instrument};

use crate::api::models::{FileSummary, ListingFilter};
use crate::api::{ApiError, DatasetApi};

/// Lists all files matching `filter`, following pagination until the API
/// reports no further pages or `limit` descriptors have been accumulated.
///
/// Results keep the upstream order determined by the filter's `orderBy` and
/// `sorting` fields; no re-sorting happens locally. When a `limit` is set,
/// the final page is fetched whole and the accumulator truncated afterwards;
/// the upstream API is never asked for a precisely-sized last page.
///
/// # Errors
///
/// Returns [`ApiError`] if any page request fails. Page failures are fatal
/// to the whole listing and are not retried.
#[instrument(level = "debug", skip(api, filter), fields(dataset = %filter.dataset_name, version = %filter.version))]
pub async fn list_all(
    api: &dyn DatasetApi,
    filter: &ListingFilter,
    limit: Option<usize>,
) -> Result<Vec<FileSummary>, ApiError> {
    let mut page = api.list_page(filter, None).await?;
    let mut files = page.files;

    while page.is_truncated && limit.is_none_or(|limit| files.len() < limit) {
        // A truncated page without a continuation token cannot be followed;
        // treat it as the final page rather than re-requesting the first one.
        let Some(token) = page.next_page_token.take() else {
            break;
        };
        debug!(accumulated = files.len(), token = %token, "fetching next listing page");
        page = api.list_page(filter, Some(&token)).await?;
        files.append(&mut page.files);
    }

    if let Some(limit) = limit {
        files.truncate(limit);
    }

    debug!(total = files.len(), "listing finished");
    Ok(files)
}
