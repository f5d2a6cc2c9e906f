//! # ApiError
//!
//! Maps request and service failures to HTTP responses. Storage failures are
//! a 500 and never look like a duplicate or a missing record.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use services::ServiceError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed upload (no image field, broken multipart body)
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Response could not be produced (e.g. metrics encoding)
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::StoreError;

    #[test]
    fn storage_failure_is_a_server_error() {
        let err = ApiError::from(ServiceError::from(StoreError::Io(std::io::Error::other("disk full"))));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn bad_request_is_client_error() {
        assert_eq!(
            ApiError::BadRequest("missing image".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
