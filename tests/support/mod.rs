//! Shared wiremock scaffolding for the Open Data platform API.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::path::Path;

use knmi_dl::RunConfig;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Dataset name used by all mock endpoints.
pub const DATASET: &str = "Actuele10mindataKNMIstations";

/// Dataset version used by all mock endpoints.
pub const VERSION: &str = "2";

/// Listing endpoint path for the mock dataset.
pub fn listing_path() -> String {
    format!("/v1/datasets/{DATASET}/versions/{VERSION}/files")
}

/// One file entry as the listing API returns it.
pub fn file_json(filename: &str, size: u64) -> Value {
    json!({
        "filename": filename,
        "size": size,
        "created": "2024-01-01T00:00:00+00:00",
        "lastModified": "2024-01-01T00:10:00+00:00"
    })
}

/// One listing page; `is_truncated` follows the token's presence.
pub fn page_json(files: &[Value], next_page_token: Option<&str>) -> Value {
    json!({
        "files": files,
        "isTruncated": next_page_token.is_some(),
        "nextPageToken": next_page_token,
        "resultCount": files.len()
    })
}

/// Mounts a single-page listing plus working download-URL and content
/// endpoints for every file.
pub async fn mount_dataset(server: &MockServer, files: &[(&str, &[u8])]) {
    let listing: Vec<Value> = files
        .iter()
        .map(|(name, body)| file_json(name, body.len() as u64))
        .collect();

    Mock::given(method("GET"))
        .and(path(listing_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&listing, None)))
        .mount(server)
        .await;

    for (name, body) in files {
        mount_file_content(server, name, body).await;
    }
}

/// Mounts the download-URL endpoint and the pre-signed content endpoint
/// for one file.
pub async fn mount_file_content(server: &MockServer, filename: &str, body: &[u8]) {
    mount_download_url(server, filename).await;

    let blob_path = format!("/blob/{filename}");
    Mock::given(method("HEAD"))
        .and(path(blob_path.clone()))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-length", body.len().to_string()),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(blob_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Mounts a download-URL endpoint whose pre-signed content endpoint
/// answers with the given error status.
pub async fn mount_broken_file(server: &MockServer, filename: &str, status: u16) {
    mount_download_url(server, filename).await;

    let blob_path = format!("/blob/{filename}");
    Mock::given(method("HEAD"))
        .and(path(blob_path.clone()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(blob_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts only the download-URL endpoint, pointing at `/blob/{filename}`
/// on the same mock server.
pub async fn mount_download_url(server: &MockServer, filename: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{filename}/url", listing_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contentType": "application/octet-stream",
            "temporaryDownloadUrl": format!("{}/blob/{filename}", server.uri())
        })))
        .mount(server)
        .await;
}

/// Builds a run configuration pointed at the mock server.
pub fn run_config(server: &MockServer, output_dir: &Path) -> RunConfig {
    RunConfig {
        api_key: "eyJtest-key".to_string(),
        base_url: server.uri(),
        dataset_name: DATASET.to_string(),
        version: VERSION.to_string(),
        concurrency: 4,
        output_dir: output_dir.to_path_buf(),
        start_date: None,
        end_date: None,
        limit: None,
        cancel: CancellationToken::new(),
        show_progress: false,
    }
}
