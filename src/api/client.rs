//! HTTP implementation of the Open Data platform API.
//!
//! The client holds the platform base URL, the caller's API key, and a
//! shared [`reqwest::Client`] so all requests reuse one connection pool.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, instrument};

use super::models::{FileDownload, ListFilesResponse, ListingFilter, wire_timestamp};
use super::{ApiError, DatasetApi};

/// Client for the Open Data platform REST API.
///
/// Cheap to clone; the underlying reqwest client is reference-counted.
#[derive(Debug, Clone)]
pub struct OpenDataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenDataClient {
    /// Creates a client against `base_url`, authenticating every request
    /// with `api_key` in the `Authorization` header.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Returns the listing endpoint for one dataset version.
    fn files_url(&self, dataset_name: &str, version: &str) -> String {
        format!(
            "{}/v1/datasets/{}/versions/{}/files",
            self.base_url,
            urlencoding::encode(dataset_name),
            urlencoding::encode(version)
        )
    }

    /// Sends a GET request and decodes the JSON body into `T`.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::status(url, status.as_u16()));
        }

        response.json::<T>().await.map_err(|e| ApiError::decode(url, e))
    }
}

#[async_trait]
impl DatasetApi for OpenDataClient {
    #[instrument(level = "debug", skip(self, filter), fields(dataset = %filter.dataset_name))]
    async fn list_page(
        &self,
        filter: &ListingFilter,
        page_token: Option<&str>,
    ) -> Result<ListFilesResponse, ApiError> {
        let url = self.files_url(&filter.dataset_name, &filter.version);

        let mut query: Vec<(&str, String)> = vec![
            ("orderBy", filter.order_by.as_query_value().to_string()),
            ("sorting", filter.sorting.as_query_value().to_string()),
        ];
        if let Some(max_keys) = filter.max_keys {
            query.push(("maxKeys", max_keys.to_string()));
        }
        if let Some(begin) = &filter.begin {
            query.push(("begin", wire_timestamp(begin)));
        }
        if let Some(end) = &filter.end {
            query.push(("end", wire_timestamp(end)));
        }
        if let Some(token) = page_token {
            query.push(("nextPageToken", token.to_string()));
        }

        debug!(url = %url, page_token = ?page_token, "requesting listing page");
        self.get_json(&url, &query).await
    }

    #[instrument(level = "debug", skip(self), fields(filename = %filename))]
    async fn download_url(
        &self,
        dataset_name: &str,
        version: &str,
        filename: &str,
    ) -> Result<FileDownload, ApiError> {
        let url = format!(
            "{}/{}/url",
            self.files_url(dataset_name, version),
            urlencoding::encode(filename)
        );

        debug!(url = %url, "requesting download URL");
        self.get_json(&url, &[]).await
    }
}
