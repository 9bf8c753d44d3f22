// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Each state carries the data produced by the stage that reached it.

use serde::Serialize;

use crate::platform::TaskDefinition;

use super::record::DeployOutcome;

/// Initial state: work item known, nothing read from the platform yet.
/// Available actions: `resolve()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Initialized;

/// Resolved: current task definition and container located.
/// Available actions: `apply()`
///
/// `B` is whatever the target needs later to repoint itself.
#[derive(Debug, Clone)]
pub struct Resolved<B> {
    pub(crate) task_definition: TaskDefinition,
    pub(crate) container: usize,
    pub(crate) fallback: bool,
    pub(crate) binding: B,
}

/// Applied: the target points at the desired image, either because it
/// already did or because a new revision was registered and swapped in.
/// Available actions: `validate()` (services), `into_record()`
#[derive(Debug, Clone)]
pub struct Applied {
    pub(crate) outcome: DeployOutcome,
}

/// Validated: convergence settled. Terminal.
#[derive(Debug, Clone)]
pub struct Validated {
    pub(crate) outcome: DeployOutcome,
    pub(crate) deployed: bool,
    pub(crate) warning: Option<String>,
}

/// Where a target sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Image already matched; nothing was registered.
    Noop,
    /// New revision registered and target repointed.
    Applied,
    /// Nothing to verify because nothing changed.
    SkippedValidation,
    /// Every running task is on the new revision (vacuously true for zero tasks).
    Converged,
    /// Some task is still on an older revision; retry validation.
    ConvergencePending,
    /// Terminal failure, including convergence that ran out of retries.
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Phase::Noop => "noop",
            Phase::Applied => "applied",
            Phase::SkippedValidation => "skipped-validation",
            Phase::Converged => "converged",
            Phase::ConvergencePending => "convergence-pending",
            Phase::Failed => "failed",
        };
        f.write_str(label)
    }
}

impl Applied {
    pub fn phase(&self) -> Phase {
        if self.outcome.deployment_needed {
            Phase::Applied
        } else {
            Phase::Noop
        }
    }
}

impl Validated {
    pub fn phase(&self) -> Phase {
        if self.outcome.deployment_needed {
            Phase::Converged
        } else {
            Phase::SkippedValidation
        }
    }
}
