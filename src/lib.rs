//! Packsmith - incremental compiler and watcher for behavior and resource packs
//!
//! A build scans each pack's sources, applies the changed files to its output
//! directory (relaxed JSON becomes canonical JSON, scripts go through an
//! external bundler), then writes the manifest and texture list. Watch mode
//! repeats the cycle for every debounced batch of filesystem changes.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-exports for convenience
pub use application::{BuildSummary, BuildUseCase, CancellationToken};
pub use config::{BuildConfig, LogLevel};
pub use error::{PacksmithError, PacksmithResult};
