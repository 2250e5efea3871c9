//! Anonymous API-key acquisition from the public developer portal.
//!
//! The portal page embeds a JWT-shaped anonymous key that grants read
//! access to open datasets. When the user does not supply a key, the CLI
//! scrapes it from this page before any listing or fetch work begins; a
//! failure here is fatal to the whole run.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument};

/// Regex matching the JWT-shaped anonymous key embedded in the portal page.
#[allow(clippy::expect_used)]
static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"eyJ[a-zA-Z0-9_-]+").expect("key regex is valid") // Static pattern, safe to panic
});

/// Errors that can occur while fetching the anonymous API key.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Portal page request failed at the network level.
    #[error("failed to fetch developer portal page {url}: {source}")]
    Portal {
        /// The portal URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Portal returned a non-success status.
    #[error("HTTP {status} fetching developer portal page {url}")]
    PortalStatus {
        /// The portal URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// No key-shaped substring was found on the page.
    #[error("no API key found on developer portal page {url}")]
    KeyNotFound {
        /// The portal URL that was searched.
        url: String,
    },
}

/// Fetches the anonymous API key from the developer portal page.
///
/// # Errors
///
/// Returns [`AuthError`] when the page cannot be fetched, returns a
/// non-success status, or contains no key-shaped substring.
#[instrument(level = "debug", skip(http))]
pub async fn anonymous_api_key(
    http: &reqwest::Client,
    portal_url: &str,
) -> Result<String, AuthError> {
    let response = http
        .get(portal_url)
        .send()
        .await
        .map_err(|e| AuthError::Portal {
            url: portal_url.to_string(),
            source: e,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::PortalStatus {
            url: portal_url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| AuthError::Portal {
        url: portal_url.to_string(),
        source: e,
    })?;

    let key = extract_api_key(&body).ok_or_else(|| AuthError::KeyNotFound {
        url: portal_url.to_string(),
    })?;

    debug!(key_len = key.len(), "anonymous API key extracted");
    Ok(key)
}

/// Extracts the first key-shaped substring from the page body.
fn extract_api_key(body: &str) -> Option<String> {
    KEY_PATTERN.find(body).map(|m| m.as_str().to_string())
}
