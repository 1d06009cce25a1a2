//! Domain Ports
//!
//! Interfaces to collaborators the build treats as black boxes. Adapters live
//! in `infrastructure`; tests substitute fakes.

mod archiver;
mod script_bundler;

pub use archiver::{ArchiveReport, ArchiveSource, Archiver};
pub use script_bundler::{BundleReport, BundleRequest, ScriptBundler};
