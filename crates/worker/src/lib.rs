//! `petkit-worker` library crate.
//!
//! Process configuration, the poll-classify-export cycle, and the
//! fullness-notification flow. The binary entrypoints live in `src/bin/`.

pub mod config;
pub mod cycle;
pub mod logging;
pub mod notify;

/// Type-erased error from a collaborator behind a trait seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
