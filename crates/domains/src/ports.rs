//! # Ports
//!
//! Any adapter must implement these traits to be wired into the service.

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::{OcrError, StoreError};
use crate::models::{Submission, SubmissionSet};

/// Persistence contract for the append-only submission log.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Reads every record in arrival order. A missing log is an empty set.
    async fn load_all(&self) -> Result<SubmissionSet, StoreError>;

    /// Adds one record at the end of the log without touching existing lines.
    async fn append(&self, submission: &Submission) -> Result<(), StoreError>;

    /// Removes every record named `name` by rewriting the remaining ones.
    /// A missing log is a successful no-op.
    async fn delete_by_name(&self, name: &str) -> Result<(), StoreError>;

    /// Raw log content for download, `None` when nothing was ever stored.
    async fn export_raw(&self) -> Result<Option<Bytes>, StoreError>;
}

/// Text recognition contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Returns the aggregate recognized text, or `None` when the provider
    /// detected nothing.
    async fn detect_text(&self, image: Bytes) -> Result<Option<String>, OcrError>;
}
