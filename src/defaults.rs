//! Default configuration values for the dataset downloader.
//!
//! These are explicit constants passed down from the CLI layer rather than
//! ambient globals; every run carries its own copy in [`crate::download::RunConfig`].

use chrono::{DateTime, Duration, Utc};

/// Base URL of the KNMI Open Data platform API.
pub const OPEN_DATA_BASE_URL: &str = "https://api.dataplatform.knmi.nl/open-data";

/// Public developer-portal page that embeds an anonymous API key.
pub const ANONYMOUS_KEY_PORTAL_URL: &str = "https://developer.dataplatform.knmi.nl/open-data-api";

/// Default dataset name.
pub const DEFAULT_DATASET_NAME: &str = "Actuele10mindataKNMIstations";

/// Default dataset version.
pub const DEFAULT_DATASET_VERSION: &str = "2";

/// Default maximum number of concurrent downloads.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Default output directory for downloaded files.
pub const DEFAULT_OUTPUT_DIR: &str = "./datasets";

/// Width of the default listing window in minutes, ending now.
const DEFAULT_WINDOW_MINUTES: i64 = 90;

/// Returns the default listing window: 90 minutes ago until now.
#[must_use]
pub fn default_date_range() -> (DateTime<Utc>, DateTime<Utc>) {
    let end = Utc::now();
    let start = end - Duration::minutes(DEFAULT_WINDOW_MINUTES);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_date_range_spans_ninety_minutes() {
        let (start, end) = default_date_range();
        assert_eq!(end - start, Duration::minutes(90));
    }

    #[test]
    fn test_default_date_range_ends_approximately_now() {
        let (_, end) = default_date_range();
        let now = Utc::now();
        assert!(now - end < Duration::seconds(5));
    }
}
