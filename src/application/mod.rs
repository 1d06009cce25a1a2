//! Application Layer
//!
//! Use cases that orchestrate a build.
//! This layer:
//! - Depends on Domain layer (entities, value objects, ports)
//! - Drives Infrastructure through the ports it is handed
//!
//! ## Use Cases
//!
//! - `BuildUseCase` - initial compile, watch loop, archiving
//! - `detect_changes` - scan a pack's sources against its cache
//! - `PackCompiler` - apply one pack's changes and run the post-steps
//! - `PackWatcher` - filesystem notifications for one pack

pub mod build;
pub mod cancel;
pub mod compile;
pub mod detect;
pub mod watch;

pub use build::{BuildPhase, BuildSummary, BuildUseCase, PackOutcome, RoundReport};
pub use cancel::CancellationToken;
pub use compile::{CycleReport, CycleSummary, PackCompiler};
pub use detect::{detect_changes, Detection};
pub use watch::{Debouncer, PackWatcher, WatchNotification, DEBOUNCE_MS};
