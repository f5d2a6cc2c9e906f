use domains::StoreError;
use thiserror::Error;

/// Faults of a service call. Duplicate and extraction outcomes are reported
/// through `SubmitOutcome` instead.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Infrastructure failure (log unreadable or unwritable)
    #[error(transparent)]
    Storage(#[from] StoreError),
}
