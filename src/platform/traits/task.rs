// ABOUTME: Running task operations trait for the orchestration platform.
// ABOUTME: List a service's tasks page by page and describe them in batches.

use async_trait::async_trait;

use crate::platform::{ListTasks, PlatformError, RunningTask, TaskPage};
use crate::types::{ClusterName, TaskArn};

/// Largest page `list_tasks` returns and largest batch `describe_tasks` accepts.
pub const MAX_TASK_BATCH: usize = 100;

/// Running task queries.
#[async_trait]
pub trait TaskOps: Send + Sync {
    /// List one page of task ARNs for a service.
    async fn list_tasks(&self, request: &ListTasks<'_>) -> Result<TaskPage, PlatformError>;

    /// Describe up to `MAX_TASK_BATCH` tasks.
    async fn describe_tasks(
        &self,
        cluster: &ClusterName,
        tasks: &[TaskArn],
    ) -> Result<Vec<RunningTask>, PlatformError>;
}
