//! # Domain Errors
//!
//! Failures raised by port implementations. Duplicate and extraction
//! outcomes are not errors; see [`crate::SubmitOutcome`].

use thiserror::Error;

/// Failures of a [`crate::SubmissionStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing resource could not be read or written
    #[error("submission store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A field would break the line format (delimiter or line break inside)
    #[error("invalid {field} value {value:?}: must not contain ',' or line breaks")]
    InvalidField { field: &'static str, value: String },
}

/// Failures of an [`crate::OcrProvider`] implementation.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Transport-level failure reaching the provider
    #[error("OCR request failed: {0}")]
    Request(String),

    /// The provider answered with an error payload or status
    #[error("OCR provider returned an error: {0}")]
    Provider(String),

    /// The provider answered with something we could not decode
    #[error("unexpected OCR response: {0}")]
    Decode(String),
}
