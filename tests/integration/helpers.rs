//! Shared test helpers for integration tests.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use cutout_api::state::AppState;
use cutout_core::config::AppConfig;
use cutout_core::metrics::MetricsStore;
use cutout_core::traits::BackgroundRemover;
use cutout_core::{AppError, AppResult};
use cutout_queue::{JobQueue, MemoryJobQueue};
use cutout_service::RemovalService;
use cutout_storage::MemoryObjectStorage;
use cutout_worker::{JobContext, JobExecutor};

const BOUNDARY: &str = "cutout-test-boundary";

/// Remover stub: decodes the input and returns it with the right half made
/// fully transparent, so output alpha content is easy to assert on.
#[derive(Debug)]
pub struct StubRemover;

#[async_trait]
impl BackgroundRemover for StubRemover {
    async fn remove(&self, image: Bytes) -> AppResult<Bytes> {
        let decoded = image::load_from_memory(&image)
            .map_err(|e| AppError::external(format!("stub decode failed: {e}")))?;
        let mut rgba = decoded.into_rgba8();
        let (width, height) = rgba.dimensions();
        for y in 0..height {
            for x in width / 2..width {
                rgba.get_pixel_mut(x, y)[3] = 0;
            }
        }
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .map_err(|e| AppError::external(format!("stub encode failed: {e}")))?;
        Ok(Bytes::from(out))
    }
}

/// Remover stub that always fails, for retry tests.
#[derive(Debug)]
pub struct FailingRemover;

#[async_trait]
impl BackgroundRemover for FailingRemover {
    async fn remove(&self, _image: Bytes) -> AppResult<Bytes> {
        Err(AppError::external("model exploded"))
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// In-memory queue, exposed for clock control and stats assertions
    pub queue: Arc<MemoryJobQueue>,
    /// In-memory object storage
    pub storage: Arc<MemoryObjectStorage>,
    /// Executor for driving worker pipelines inline
    pub executor: JobExecutor,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        Self::build(Arc::new(StubRemover), tweak)
    }

    pub fn with_failing_remover() -> Self {
        Self::build(Arc::new(FailingRemover), |_| {})
    }

    fn build(
        remover: Arc<dyn BackgroundRemover>,
        tweak: impl FnOnce(&mut AppConfig),
    ) -> Self {
        let mut config = AppConfig::default();
        tweak(&mut config);
        let config = Arc::new(config);

        let queue = Arc::new(MemoryJobQueue::new());
        let storage = Arc::new(MemoryObjectStorage::new());
        let metrics = Arc::new(MetricsStore::new());

        let state = AppState::new(
            Arc::clone(&config),
            queue.clone() as Arc<dyn JobQueue>,
            storage.clone(),
            remover,
            Arc::clone(&metrics),
        );

        let executor = JobExecutor::new(JobContext {
            queue: queue.clone() as Arc<dyn JobQueue>,
            storage: storage.clone(),
            removal: state.removal.clone(),
            metrics,
        });

        let router = cutout_api::router::build_router(state);

        Self {
            router,
            queue,
            storage,
            executor,
        }
    }

    /// Runs every currently-dequeuable job through the worker pipelines,
    /// applying the same complete/fail bookkeeping the runner does.
    pub async fn drain_queue(&self) {
        while let Some(job) = self.queue.dequeue().await.expect("dequeue failed") {
            match self.executor.execute(&job).await {
                Ok(result) => self
                    .queue
                    .complete(job.id, result)
                    .await
                    .expect("complete failed"),
                Err(err) => {
                    self.queue
                        .fail_attempt(job.id, &err.message)
                        .await
                        .expect("fail_attempt failed");
                }
            }
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(req).await
    }

    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(req).await
    }

    pub async fn post_multipart(&self, path: &str, parts: &[Part]) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body (Null for binary responses)
    pub body: Value,
    /// Raw body bytes
    pub bytes: Bytes,
}

impl TestResponse {
    pub fn json_str(&self, key: &str) -> String {
        self.body
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("missing '{key}' in {:?}", self.body))
            .to_string()
    }
}

/// One part of a multipart form.
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn file(name: &str, filename: &str, content_type: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            filename: Some(filename.to_string()),
            content_type: Some(content_type.to_string()),
            data,
        }
    }

    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            filename: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match &part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name).as_bytes(),
            ),
        }
        if let Some(content_type) = &part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Opaque PNG of the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([90, 120, 30, 255]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .expect("png encode failed");
    out
}
