//! dedupdash application library
//!
//! Adapters for the dedup server's push channel and REST API, the dashboard
//! service that drives the synchronization core, and the terminal UI.

pub mod adapters;
pub mod cli;
pub mod logging;
pub mod services;
pub mod tui;
