//! Infrastructure Layer
//!
//! Concrete implementations of domain ports and process-level plumbing.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - atomic writes, pruning removals, directory mirroring
//! - `bundler/` - `ScriptBundler` backed by the esbuild binary
//! - `archive/` - `Archiver` backed by zip
//! - `logging` - tracing subscriber setup

pub mod archive;
pub mod bundler;
pub mod fs;
pub mod logging;

pub use archive::ZipArchiver;
pub use bundler::EsbuildBundler;
