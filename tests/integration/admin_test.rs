//! Admin surface: manual cleanup, metrics exposure, health.

use bytes::Bytes;
use chrono::{Duration, Utc};
use http::StatusCode;

use cutout_core::traits::ObjectStorage;

use crate::helpers::{self, Part, TestApp};

#[tokio::test]
async fn test_manual_cleanup_deletes_expired_artifacts() {
    let app = TestApp::new();
    let now = Utc::now();
    app.storage.put_with_last_modified(
        "jobs/old/result.png",
        Bytes::from_static(b"old"),
        "image/png",
        now - Duration::seconds(200_000),
    );
    app.storage.put_with_last_modified(
        "jobs/new/result.png",
        Bytes::from_static(b"new"),
        "image/png",
        now - Duration::seconds(10),
    );

    let response = app.post_empty("/api/admin/cleanup").await;
    assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);
    let job_id = response.json_str("cleanup_job_id");

    app.drain_queue().await;

    let status = app.get(&format!("/api/jobs/{job_id}")).await;
    assert_eq!(status.json_str("status"), "finished");
    assert!(status.body["download_url"].is_null(), "cleanup has no artifact");

    assert_eq!(app.storage.len(), 1);
    assert!(app.storage.get("jobs/new/result.png").await.is_ok());
}

#[tokio::test]
async fn test_metrics_json_reflects_activity() {
    let app = TestApp::new();
    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(4, 4))],
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let metrics = app.get("/api/metrics").await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert_eq!(metrics.body["counters"]["jobs_submitted"], 1);
    assert_eq!(metrics.body["gauges"]["queue_queued"], 1);

    app.drain_queue().await;

    let metrics = app.get("/api/metrics").await;
    assert_eq!(metrics.body["counters"]["images_processed"], 1);
    assert_eq!(metrics.body["gauges"]["queue_queued"], 0);
}

#[tokio::test]
async fn test_metrics_text_exposition() {
    let app = TestApp::new();
    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(4, 4))],
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED);

    let metrics = app.get("/metrics").await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert!(metrics.headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let text = String::from_utf8(metrics.bytes.to_vec()).unwrap();
    assert!(text.contains("cutout_jobs_submitted 1"), "{text}");
    assert!(text.contains("cutout_queue_queued 1"), "{text}");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let response = app.get("/api/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json_str("status"), "ok");
}
