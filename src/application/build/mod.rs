//! Build orchestration
//!
//! `BuildUseCase` runs the initial compile of every enabled pack, then, in
//! watch mode, rebuilds on debounced file changes until cancelled.

mod outcome;
mod use_case;


pub use outcome::{BuildPhase, BuildSummary, PackOutcome, RoundReport};
pub use use_case::BuildUseCase;
