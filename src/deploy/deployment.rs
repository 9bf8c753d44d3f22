// ABOUTME: Generic deployment struct parameterized by target and state marker.
// ABOUTME: State types carry their own data for compile-time guarantees.

use crate::types::RoleArn;

use super::record::{DeployOutcome, DeployRecord, ValidationRecord};
use super::release::WorkItem;
use super::state::{Applied, Initialized, Resolved, Validated};
use super::target::ServiceTarget;

/// One target's deployment in progress, parameterized by its current state.
///
/// The state type parameter `S` carries what the previous stage produced,
/// so `apply()` cannot run without a resolved task definition and
/// `validate()` cannot run before the target was applied.
#[derive(Debug, Clone)]
pub struct Deployment<T, S> {
    pub(crate) item: WorkItem<T>,
    pub(crate) state: S,
}

impl<T> Deployment<T, Initialized> {
    /// Start a deployment for a work item.
    pub fn new(item: WorkItem<T>) -> Self {
        Deployment {
            item,
            state: Initialized,
        }
    }
}

impl<T, S> Deployment<T, S> {
    pub fn target(&self) -> &T {
        &self.item.target
    }

    pub fn role(&self) -> &RoleArn {
        &self.item.assume_role
    }
}

impl<T, B> Deployment<T, Resolved<B>> {
    /// Image of the selected container in the current task definition.
    pub fn current_image(&self) -> &str {
        &self.state.task_definition.containers()[self.state.container].image
    }

    /// Whether the container was picked by fallback rather than by hint.
    pub fn used_fallback(&self) -> bool {
        self.state.fallback
    }
}

impl<T> Deployment<T, Applied> {
    /// Rebuild an applied deployment from a deploy stage record.
    pub fn from_record(record: DeployRecord<T>) -> Self {
        Deployment {
            item: record.item,
            state: Applied {
                outcome: record.outcome,
            },
        }
    }

    pub fn outcome(&self) -> &DeployOutcome {
        &self.state.outcome
    }

    pub fn state(&self) -> &Applied {
        &self.state
    }

    /// The record handed to the next stage.
    pub fn into_record(self) -> DeployRecord<T> {
        DeployRecord {
            item: self.item,
            outcome: self.state.outcome,
        }
    }
}

impl Deployment<ServiceTarget, Validated> {
    pub fn deployed(&self) -> bool {
        self.state.deployed
    }

    pub fn warning(&self) -> Option<&str> {
        self.state.warning.as_deref()
    }

    pub fn state(&self) -> &Validated {
        &self.state
    }

    /// The final record for this target.
    pub fn into_record(self) -> ValidationRecord {
        let outcome = self.state.outcome;
        ValidationRecord {
            item: self.item,
            previous_image: outcome.previous_image,
            previous_task_definition: outcome.previous_task_definition,
            deployed_task_definition: outcome.deployed_task_definition,
            deployed: self.state.deployed,
            warning: self.state.warning,
        }
    }
}
