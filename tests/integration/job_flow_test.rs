//! Full job lifecycle: submit, process, poll, download, cancel, retry.

use std::io::{Cursor, Read};

use http::StatusCode;
use uuid::Uuid;

use crate::helpers::{self, Part, TestApp};

#[tokio::test]
async fn test_single_job_end_to_end() {
    let app = TestApp::new();

    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(20, 20))],
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);
    assert_eq!(response.json_str("status"), "queued");
    let job_id = response.json_str("job_id");

    let status = app.get(&format!("/api/jobs/{job_id}")).await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.json_str("status"), "queued");

    app.drain_queue().await;

    let status = app.get(&format!("/api/jobs/{job_id}")).await;
    assert_eq!(status.json_str("status"), "finished");
    assert_eq!(status.body["progress"], 100);
    assert_eq!(status.json_str("stage"), "done");
    assert!(status.body["download_url"].is_string());

    let download = app.get(&format!("/api/jobs/{job_id}/download")).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.headers["content-type"], "image/png");
    assert!(download.headers["content-disposition"]
        .to_str()
        .unwrap()
        .contains("cat.png"));

    let img = image::load_from_memory(&download.bytes).unwrap().into_rgba8();
    assert_eq!(img.dimensions(), (20, 20));
    assert_eq!(img.get_pixel(19, 10)[3], 0, "right half should be transparent");
    assert_eq!(img.get_pixel(0, 10)[3], 255, "left half should stay opaque");
}

#[tokio::test]
async fn test_batch_job_produces_zip_with_sanitized_names() {
    let app = TestApp::new();

    let response = app
        .post_multipart(
            "/api/jobs/batch",
            &[
                Part::file("files", "cat one.png", "image/png", helpers::png_bytes(6, 6)),
                Part::file("files", "dög.png", "image/png", helpers::png_bytes(6, 6)),
                Part::file("files", "bird.jpg", "image/png", helpers::png_bytes(6, 6)),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED, "{:?}", response.body);
    let job_id = response.json_str("job_id");

    app.drain_queue().await;

    let status = app.get(&format!("/api/jobs/{job_id}")).await;
    assert_eq!(status.json_str("status"), "finished");

    let download = app.get(&format!("/api/jobs/{job_id}/download")).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.headers["content-type"], "application/zip");
    assert!(download.headers["content-disposition"]
        .to_str()
        .unwrap()
        .contains("removed-backgrounds.zip"));

    let mut archive = zip::ZipArchive::new(Cursor::new(download.bytes.to_vec())).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["bird.png", "catone.png", "dg.png"]);

    // Every entry must itself be a decodable PNG.
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).unwrap();
        image::load_from_memory(&data).unwrap();
    }
}

#[tokio::test]
async fn test_sync_remove_endpoint_returns_png_inline() {
    let app = TestApp::new();

    let response = app
        .post_multipart(
            "/api/remove",
            &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(10, 10))],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["content-type"], "image/png");
    let img = image::load_from_memory(&response.bytes).unwrap().into_rgba8();
    assert_eq!(img.dimensions(), (10, 10));
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let app = TestApp::new();
    let response = app.get(&format!("/api/jobs/{}", Uuid::new_v4())).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json_str("error"), "NOT_FOUND");
}

#[tokio::test]
async fn test_download_before_finish_is_409() {
    let app = TestApp::new();
    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(4, 4))],
        )
        .await;
    let job_id = response.json_str("job_id");

    let download = app.get(&format!("/api/jobs/{job_id}/download")).await;
    assert_eq!(download.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_canceled_job_is_never_processed() {
    let app = TestApp::new();
    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(4, 4))],
        )
        .await;
    let job_id = response.json_str("job_id");

    let cancel = app.post_empty(&format!("/api/jobs/{job_id}/cancel")).await;
    assert_eq!(cancel.status, StatusCode::OK);
    assert_eq!(cancel.json_str("status"), "canceled");

    app.drain_queue().await;

    assert!(app.storage.is_empty(), "canceled job must not produce output");
    let status = app.get(&format!("/api/jobs/{job_id}")).await;
    assert_eq!(status.json_str("status"), "canceled");

    // Canceling again is a no-op.
    let cancel = app.post_empty(&format!("/api/jobs/{job_id}/cancel")).await;
    assert_eq!(cancel.json_str("status"), "canceled");
}

#[tokio::test]
async fn test_failed_job_exhausts_retries_then_manual_retry_clones_it() {
    let app = TestApp::with_failing_remover();

    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(4, 4))],
        )
        .await;
    let job_id = response.json_str("job_id");

    // Attempt 1 fails; a retry is scheduled 5 seconds out.
    app.drain_queue().await;
    let status = app.get(&format!("/api/jobs/{job_id}")).await;
    assert_eq!(status.json_str("status"), "queued");

    // Retrying before the backoff elapses is a conflict.
    let retry = app.post_empty(&format!("/api/jobs/{job_id}/retry")).await;
    assert_eq!(retry.status, StatusCode::CONFLICT);

    // Attempt 2 after the first backoff.
    app.queue.advance(chrono::Duration::seconds(6));
    app.drain_queue().await;
    let status = app.get(&format!("/api/jobs/{job_id}")).await;
    assert_eq!(status.json_str("status"), "queued");

    // Attempt 3 after the second backoff exhausts the budget.
    app.queue.advance(chrono::Duration::seconds(21));
    app.drain_queue().await;
    let status = app.get(&format!("/api/jobs/{job_id}")).await;
    assert_eq!(status.json_str("status"), "failed");
    assert!(status.json_str("error").contains("model exploded"));

    // Manual retry clones the job under a fresh id.
    let retry = app.post_empty(&format!("/api/jobs/{job_id}/retry")).await;
    assert_eq!(retry.status, StatusCode::ACCEPTED, "{:?}", retry.body);
    let new_id = retry.json_str("job_id");
    assert_ne!(new_id, job_id);
    assert_eq!(retry.json_str("previous_job_id"), job_id);
    assert_eq!(retry.json_str("status"), "queued");
}
