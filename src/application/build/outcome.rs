//! Results reported by the build orchestrator

use crate::application::compile::CycleSummary;
use crate::domain::value_objects::PackKind;
use crate::error::PacksmithError;

/// Lifecycle of a build invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildPhase {
    #[default]
    Idle,
    InitialCompile,
    Watching,
    Rebuilding,
    Stopped,
}

/// How one pack's cycle ended
#[derive(Debug)]
pub enum PackOutcome {
    Succeeded(CycleSummary),
    Failed(PacksmithError),
    Cancelled,
}

impl PackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PackOutcome::Succeeded(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PackOutcome::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PackOutcome::Cancelled)
    }
}

/// Outcomes of one round, per enabled pack
#[derive(Debug, Default)]
pub struct RoundReport {
    pub behavior: Option<PackOutcome>,
    pub resource: Option<PackOutcome>,
}

impl RoundReport {
    pub fn get(&self, kind: PackKind) -> Option<&PackOutcome> {
        match kind {
            PackKind::Behavior => self.behavior.as_ref(),
            PackKind::Resource => self.resource.as_ref(),
        }
    }

    pub fn set(&mut self, kind: PackKind, outcome: PackOutcome) {
        match kind {
            PackKind::Behavior => self.behavior = Some(outcome),
            PackKind::Resource => self.resource = Some(outcome),
        }
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (PackKind, &PackOutcome)> {
        [
            (PackKind::Behavior, self.behavior.as_ref()),
            (PackKind::Resource, self.resource.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, outcome)| outcome.map(|o| (kind, o)))
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes().any(|(_, o)| o.is_failed())
    }

    pub fn was_cancelled(&self) -> bool {
        self.outcomes().any(|(_, o)| o.is_cancelled())
    }
}

/// Returned by `BuildUseCase::build`
#[derive(Debug, Default)]
pub struct BuildSummary {
    /// Rounds run, the initial compile included
    pub rounds: usize,
    pub last_round: Option<RoundReport>,
    /// Whether cancellation ended the build
    pub cancelled: bool,
}

impl BuildSummary {
    /// Whether the most recent round had a failed pack
    pub fn has_failures(&self) -> bool {
        self.last_round
            .as_ref()
            .is_some_and(RoundReport::has_failures)
    }
}
