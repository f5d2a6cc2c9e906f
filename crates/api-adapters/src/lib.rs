//! # api-adapters
//!
//! The HTTP surface of the check-in service: upload, dashboard list,
//! delete, CSV download, plus health, metrics and the static pages.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod client_ip;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
mod router;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use router::{router, AppState, RouterOptions};
