//! dedupdash core - pure synchronization logic with no I/O
//!
//! This crate holds the live event synchronization layer of the dashboard:
//! connection lifecycle, frame classification, progress aggregation, error
//! notifications and the activity feed. Networking, terminal rendering and
//! filesystem access are handled by adapters behind the ports defined here.

pub mod domain;
pub mod ports;
pub mod app;
pub mod error;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
