//! Admission-control behavior: size, count, content-type, and rate limits.

use http::StatusCode;

use cutout_queue::JobQueue;

use crate::helpers::{self, Part, TestApp};

#[tokio::test]
async fn test_oversized_payload_is_rejected_without_enqueue() {
    let app = TestApp::with_config(|config| {
        config.limits.max_image_bytes = 1_000;
    });

    let big = vec![0u8; 2_000];
    let response = app
        .post_multipart("/api/jobs", &[Part::file("file", "big.png", "image/png", big)])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json_str("error"), "VALIDATION_ERROR");
    assert_eq!(app.queue.stats().await.unwrap().queued, 0);
}

#[tokio::test]
async fn test_pixel_limit_is_rejected() {
    let app = TestApp::with_config(|config| {
        config.limits.max_image_pixels = 100;
    });

    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "big.png", "image/png", helpers::png_bytes(20, 20))],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json_str("message").contains("pixels"));
}

#[tokio::test]
async fn test_non_image_upload_is_rejected() {
    let app = TestApp::new();
    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "doc.pdf", "application/pdf", vec![1, 2, 3])],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json_str("message").contains("not an image"));
}

#[tokio::test]
async fn test_batch_over_file_limit_is_rejected_whole() {
    let app = TestApp::with_config(|config| {
        config.limits.max_batch_files = 2;
    });

    let parts: Vec<Part> = (0..3)
        .map(|i| {
            Part::file(
                "files",
                &format!("f{i}.png"),
                "image/png",
                helpers::png_bytes(4, 4),
            )
        })
        .collect();
    let response = app.post_multipart("/api/jobs/batch", &parts).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.queue.stats().await.unwrap().queued, 0);
}

#[tokio::test]
async fn test_invalid_refinement_options_are_rejected() {
    let app = TestApp::new();
    let response = app
        .post_multipart(
            "/api/jobs",
            &[
                Part::file("file", "cat.png", "image/png", helpers::png_bytes(4, 4)),
                Part::text("feather_radius", "50"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json_str("message").contains("feather_radius"));
}

#[tokio::test]
async fn test_rate_limit_applies_to_submissions_only() {
    let app = TestApp::with_config(|config| {
        config.limits.rate_limit_per_minute = 3;
    });

    for _ in 0..3 {
        let response = app
            .post_multipart(
                "/api/jobs",
                &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(4, 4))],
            )
            .await;
        assert_eq!(response.status, StatusCode::ACCEPTED);
    }

    let response = app
        .post_multipart(
            "/api/jobs",
            &[Part::file("file", "cat.png", "image/png", helpers::png_bytes(4, 4))],
        )
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json_str("error"), "RATE_LIMITED");

    // Polling is exempt from the submission limit.
    let health = app.get("/api/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(app.queue.stats().await.unwrap().queued, 3);
}
