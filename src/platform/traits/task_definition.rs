// ABOUTME: Task definition operations trait for the orchestration platform.
// ABOUTME: Describe existing revisions and register new ones.

use async_trait::async_trait;

use crate::platform::{PlatformError, RegisterTaskDefinition, TaskDefinition};
use crate::types::TaskDefinitionArn;

/// Task definition operations. Revisions are immutable; there is no update.
#[async_trait]
pub trait TaskDefinitionOps: Send + Sync {
    /// Describe a task definition revision.
    async fn describe_task_definition(
        &self,
        task_definition: &TaskDefinitionArn,
    ) -> Result<TaskDefinition, PlatformError>;

    /// Register a new revision in the request's family.
    async fn register_task_definition(
        &self,
        request: &RegisterTaskDefinition,
    ) -> Result<TaskDefinition, PlatformError>;
}
