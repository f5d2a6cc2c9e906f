//! ocr-checkin/crates/domains/src/lib.rs
//!
//! The central domain logic and port definitions for the check-in service.
//! Nothing in this crate performs I/O; adapters live in sibling crates.

pub mod errors;
pub mod models;
pub mod nickname;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use nickname::extract_nickname;
pub use ports::*;
