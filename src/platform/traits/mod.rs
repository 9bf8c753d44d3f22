// ABOUTME: Composable capability traits for the orchestration platform.
// ABOUTME: Defines ServiceOps, TaskDefinitionOps, TaskOps, RuleOps, IdentityOps, and Connect.

mod identity;
mod rule;
mod service;
mod task;
mod task_definition;

pub use identity::{Connect, IdentityOps};
pub use rule::RuleOps;
pub use service::ServiceOps;
pub use task::{MAX_TASK_BATCH, TaskOps};
pub use task_definition::TaskDefinitionOps;

/// Everything a deployment pipeline needs from an authorized platform client.
pub trait FullPlatform: ServiceOps + TaskDefinitionOps + TaskOps + RuleOps {}

impl<T: ServiceOps + TaskDefinitionOps + TaskOps + RuleOps> FullPlatform for T {}
