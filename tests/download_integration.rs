//! Integration tests for the full download flow.
//!
//! These tests run the orchestrator against a mock Open Data API and a
//! temporary output directory, covering the aggregate-count invariant,
//! idempotent re-runs, per-file failure isolation, and byte accounting.

use knmi_dl::{RunError, run};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::{
    file_json, listing_path, mount_broken_file, mount_dataset, mount_download_url,
    mount_file_content, page_json, run_config,
};

#[tokio::test]
async fn test_full_run_downloads_all_files() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_dataset(
        &server,
        &[
            ("obs_0000.nc", b"first file content"),
            ("obs_0010.nc", b"second"),
            ("obs_0020.nc", b"third file"),
        ],
    )
    .await;

    let stats = run(run_config(&server, temp_dir.path())).await.unwrap();

    assert_eq!(stats.total_files(), 3);
    assert_eq!(stats.downloaded_files(), 3);
    assert_eq!(stats.skipped_files(), 0);
    assert_eq!(stats.failed_count(), 0);

    let content = std::fs::read(temp_dir.path().join("obs_0000.nc")).unwrap();
    assert_eq!(content, b"first file content");
    assert!(temp_dir.path().join("obs_0010.nc").exists());
    assert!(temp_dir.path().join("obs_0020.nc").exists());
}

#[tokio::test]
async fn test_byte_totals_aggregate_across_files() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_dataset(
        &server,
        &[("a.nc", b"0123456789"), ("b.nc", b"0123"), ("c.nc", b"01")],
    )
    .await;

    let stats = run(run_config(&server, temp_dir.path())).await.unwrap();

    assert_eq!(stats.total_bytes_downloaded(), 16);
}

#[tokio::test]
async fn test_rerun_over_populated_directory_skips_everything() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_dataset(&server, &[("a.nc", b"aaa"), ("b.nc", b"bbb")]).await;

    let first = run(run_config(&server, temp_dir.path())).await.unwrap();
    assert_eq!(first.downloaded_files(), 2);

    let second = run(run_config(&server, temp_dir.path())).await.unwrap();
    assert_eq!(second.total_files(), 2);
    assert_eq!(second.downloaded_files(), 0);
    assert_eq!(second.skipped_files(), 2);
    assert_eq!(second.failed_count(), 0);
}

#[tokio::test]
async fn test_failed_transfer_is_isolated_and_leaves_no_partial_file() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    // Listing advertises three files; one of them serves a 500
    Mock::given(method("GET"))
        .and(path(listing_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            &[
                file_json("good-1.nc", 4),
                file_json("broken.nc", 4),
                file_json("good-2.nc", 4),
            ],
            None,
        )))
        .mount(&server)
        .await;

    mount_file_content(&server, "good-1.nc", b"ok-1").await;
    mount_broken_file(&server, "broken.nc", 500).await;
    mount_file_content(&server, "good-2.nc", b"ok-2").await;

    let stats = run(run_config(&server, temp_dir.path())).await.unwrap();

    assert_eq!(stats.total_files(), 3);
    assert_eq!(stats.downloaded_files(), 2);
    assert_eq!(stats.failed_count(), 1);
    assert_eq!(stats.failed_files(), vec!["broken.nc"]);
    // Count invariant holds after a run that reached the fetch stage
    assert_eq!(
        stats.downloaded_files() + stats.skipped_files() + stats.failed_count(),
        stats.total_files()
    );

    assert!(!temp_dir.path().join("broken.nc").exists());
    assert!(temp_dir.path().join("good-1.nc").exists());
    assert!(temp_dir.path().join("good-2.nc").exists());
}

#[tokio::test]
async fn test_missing_download_url_is_a_per_file_failure() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path(listing_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            &[file_json("no-url.nc", 4), file_json("good.nc", 2)],
            None,
        )))
        .mount(&server)
        .await;

    // URL endpoint answers, but without a temporaryDownloadUrl
    Mock::given(method("GET"))
        .and(path(format!("{}/no-url.nc/url", listing_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contentType": "application/octet-stream"
        })))
        .mount(&server)
        .await;
    mount_file_content(&server, "good.nc", b"ok").await;

    let stats = run(run_config(&server, temp_dir.path())).await.unwrap();

    assert_eq!(stats.failed_files(), vec!["no-url.nc"]);
    assert_eq!(stats.downloaded_files(), 1);
    assert!(!temp_dir.path().join("no-url.nc").exists());
}

#[tokio::test]
async fn test_download_url_endpoint_error_is_a_per_file_failure() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path(listing_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(&[file_json("denied.nc", 4)], None)),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/denied.nc/url", listing_path())))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let stats = run(run_config(&server, temp_dir.path())).await.unwrap();

    assert_eq!(stats.total_files(), 1);
    assert_eq!(stats.failed_files(), vec!["denied.nc"]);
}

#[tokio::test]
async fn test_listing_failure_aborts_run_without_stats() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path(listing_path()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = run(run_config(&server, temp_dir.path())).await;
    assert!(matches!(result, Err(RunError::Listing(_))));
}

#[tokio::test]
async fn test_empty_window_produces_empty_stats() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path(listing_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[], None)))
        .mount(&server)
        .await;

    let stats = run(run_config(&server, temp_dir.path())).await.unwrap();

    assert_eq!(stats.total_files(), 0);
    assert_eq!(stats.downloaded_files(), 0);
    assert_eq!(stats.failed_count(), 0);
}

#[tokio::test]
async fn test_limit_caps_the_number_of_fetched_files() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path(listing_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(
            &[
                file_json("a.nc", 2),
                file_json("b.nc", 2),
                file_json("c.nc", 2),
            ],
            None,
        )))
        .mount(&server)
        .await;

    mount_file_content(&server, "a.nc", b"aa").await;
    mount_file_content(&server, "b.nc", b"bb").await;
    mount_file_content(&server, "c.nc", b"cc").await;

    let mut config = run_config(&server, temp_dir.path());
    config.limit = Some(2);
    let stats = run(config).await.unwrap();

    assert_eq!(stats.total_files(), 2);
    assert_eq!(stats.downloaded_files(), 2);
    assert!(!temp_dir.path().join("c.nc").exists());
}

#[tokio::test]
async fn test_cancelled_token_records_pending_files_as_failed() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    mount_dataset(&server, &[("a.nc", b"aa"), ("b.nc", b"bb")]).await;

    let config = run_config(&server, temp_dir.path());
    config.cancel.cancel();
    let stats = run(config).await.unwrap();

    assert_eq!(stats.total_files(), 2);
    assert_eq!(stats.downloaded_files(), 0);
    assert_eq!(stats.failed_count(), 2);
    assert!(!temp_dir.path().join("a.nc").exists());
}

#[tokio::test]
async fn test_head_probe_without_content_length_is_tolerated() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path(listing_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(&[file_json("sizeless.nc", 5)], None)),
        )
        .mount(&server)
        .await;

    mount_download_url(&server, "sizeless.nc").await;
    // No HEAD mock: the probe sees a 404 with no content-length header
    Mock::given(method("GET"))
        .and(path("/blob/sizeless.nc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"bytes".to_vec()))
        .mount(&server)
        .await;

    let stats = run(run_config(&server, temp_dir.path())).await.unwrap();

    assert_eq!(stats.downloaded_files(), 1);
    assert_eq!(stats.total_bytes_downloaded(), 5);
}
