//! # ocr-adapters
//!
//! Google Cloud Vision implementation of `OcrProvider`, using the REST
//! `images:annotate` endpoint with `TEXT_DETECTION`. The first text
//! annotation carries the whole recognized text; the rest are single words.

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use domains::{OcrError, OcrProvider};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

pub struct GoogleVisionOcr {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl GoogleVisionOcr {
    pub fn new(endpoint: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Serialize)]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    /// Base64 of the raw image bytes
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl AnnotateRequest {
    fn text_detection(image: &[u8]) -> Self {
        Self {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: vec![Feature { kind: "TEXT_DETECTION" }],
            }],
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    error: Option<ApiStatus>,
}

#[derive(Deserialize, Debug)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Deserialize, Debug)]
struct ApiStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Pulls the aggregate text out of an annotate response.
fn full_text(response: AnnotateResponse) -> Result<Option<String>, OcrError> {
    let Some(first) = response.responses.into_iter().next() else {
        return Ok(None);
    };
    if let Some(status) = first.error {
        return Err(OcrError::Provider(format!("{} (code {})", status.message, status.code)));
    }
    Ok(first
        .text_annotations
        .into_iter()
        .next()
        .map(|annotation| annotation.description))
}

#[async_trait]
impl OcrProvider for GoogleVisionOcr {
    #[instrument(skip(self, image), fields(image_len = image.len()))]
    async fn detect_text(&self, image: Bytes) -> Result<Option<String>, OcrError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&AnnotateRequest::text_detection(&image))
            .send()
            .await
            .map_err(|e| OcrError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Provider(format!("HTTP {status}: {body}")));
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| OcrError::Decode(e.without_url().to_string()))?;
        let text = full_text(parsed)?;
        debug!(found = text.is_some(), "OCR response decoded");
        Ok(text)
    }
}
