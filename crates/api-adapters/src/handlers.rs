//! # Handlers
//!
//! This module coordinates the flow between HTTP requests and the
//! submission service.

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use domains::{ExtractionFailure, Submission, SubmitOutcome};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::client_ip::ClientIp;
use crate::error::ApiError;
use crate::router::AppState;

/// Multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";

/// Attachment name of the CSV export.
pub const EXPORT_FILENAME: &str = "submitted_list.csv";

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UploadResponse {
    pub success: bool,
    /// `"normal"` or `"duplicate"`; absent on extraction failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    pub message: &'static str,
}

impl From<SubmitOutcome> for UploadResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        match outcome {
            SubmitOutcome::Accepted(submission) => UploadResponse {
                success: true,
                status: Some("normal"),
                nickname: Some(submission.name),
                message: "Submission complete!",
            },
            SubmitOutcome::Duplicate { nickname, .. } => UploadResponse {
                success: true,
                status: Some("duplicate"),
                nickname: Some(nickname),
                message: "This nickname or IP has already been submitted.",
            },
            SubmitOutcome::ExtractionFailed(reason) => UploadResponse {
                success: false,
                status: None,
                nickname: None,
                message: match reason {
                    ExtractionFailure::NoText => "No text could be recognized in the image.",
                    ExtractionFailure::NoNickname => "No nickname could be found in the image.",
                    ExtractionFailure::ProviderError => "Text recognition failed. Please try again.",
                    ExtractionFailure::Timeout => "Text recognition timed out. Please try again.",
                },
            },
        }
    }
}

/// `POST /upload`: OCR the photo and record the nickname.
pub async fn upload(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let image = read_image(&mut multipart).await?;
    let outcome = state.service.submit_image(image, &ip).await?;
    state.metrics.record(&outcome);
    Ok(Json(outcome.into()))
}

async fn read_image(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let image = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        debug!(len = image.len(), "received image");
        return Ok(image);
    }
    Err(ApiError::BadRequest(format!("missing multipart field `{IMAGE_FIELD}`")))
}

/// `GET /list`: every submission in arrival order.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Submission>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

/// `DELETE /list/{name}`
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.service.delete_by_name(&name).await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// `GET /download`: the raw log as a CSV attachment.
pub async fn download(State(state): State<AppState>) -> Result<Response, ApiError> {
    let Some(raw) = state.service.export().await? else {
        return Ok("No data".into_response());
    };
    let disposition = format!("attachment; filename=\"{EXPORT_FILENAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        raw,
    )
        .into_response())
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(
            header::CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
        .into_response())
}
