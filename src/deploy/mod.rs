// ABOUTME: Deployment pipeline using the type state pattern.
// ABOUTME: Exports targets, records, state markers, and the initializer stage.

mod deployment;
mod error;
mod record;
mod release;
mod state;
mod target;
mod transitions;

pub use deployment::Deployment;
pub use error::{DeployError, DeployErrorKind};
pub use record::{DeployOutcome, DeployRecord, ValidationRecord};
pub use release::{Release, ReleasePlan, TargetEntry, WorkItem, initialize};
pub use state::{Applied, Initialized, Phase, Resolved, Validated};
pub use target::{
    ContainerMatch, ContainerSelection, ScheduledTaskTarget, ServiceTarget, Target,
    select_container,
};
pub use transitions::TransitionResult;
