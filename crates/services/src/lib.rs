//! # services
//!
//! Application use cases. Coordinates the OCR port, the nickname heuristic
//! and the submission store; knows nothing about HTTP or files.

mod error;
mod submission_service;

pub use error::ServiceError;
pub use submission_service::SubmissionService;
