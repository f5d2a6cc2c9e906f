//! Shared fixtures for the integration test targets.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use bytes::Bytes;
use domains::{OcrError, OcrProvider};
use services::SubmissionService;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storage_adapters::FileSubmissionStore;

pub const BOUNDARY: &str = "----checkin-test-boundary";

/// Unique submission log under the system temp dir, removed on drop.
pub struct TempLog {
    path: PathBuf,
}

impl TempLog {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("checkin-it-{}.nickname", uuid::Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> Arc<FileSubmissionStore> {
        Arc::new(FileSubmissionStore::new(&self.path))
    }

    pub fn read(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_default()
    }
}

impl Default for TempLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempLog {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Treats the uploaded bytes as the text the provider "recognized", so a test
/// uploads the OCR result it wants. Empty uploads detect nothing.
pub struct EchoOcr;

#[async_trait]
impl OcrProvider for EchoOcr {
    async fn detect_text(&self, image: Bytes) -> Result<Option<String>, OcrError> {
        if image.is_empty() {
            return Ok(None);
        }
        String::from_utf8(image.to_vec())
            .map(Some)
            .map_err(|e| OcrError::Decode(e.to_string()))
    }
}

pub fn service_with(log: &TempLog, ocr: Arc<dyn OcrProvider>) -> Arc<SubmissionService> {
    Arc::new(SubmissionService::new(log.store(), ocr, Duration::from_secs(5)))
}

#[cfg(feature = "web-axum")]
pub fn app(log: &TempLog) -> Router {
    app_with(log, Arc::new(EchoOcr))
}

#[cfg(feature = "web-axum")]
pub fn app_with(log: &TempLog, ocr: Arc<dyn OcrProvider>) -> Router {
    use api_adapters::{router, AppState, Metrics, RouterOptions};

    router(
        AppState {
            service: service_with(log, ocr),
            metrics: Arc::new(Metrics::new()),
        },
        RouterOptions {
            max_upload_bytes: 1024 * 1024,
            static_dir: None,
        },
    )
}

/// `POST /upload` with one multipart field named `field`.
pub fn upload_request(field: &str, content: &[u8], forwarded_for: &str) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"screen.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(body))
        .unwrap()
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
