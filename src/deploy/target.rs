// ABOUTME: Deployment targets: long-running services and schedule-rule tasks.
// ABOUTME: Each knows how to find its current task definition and how to repoint itself.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::platform::{
    ContainerDefinition, FullPlatform, PlatformError, ResponseMetadata, RuleTarget,
};
use crate::types::{ClusterArn, ClusterName, ContainerHint, RuleName, ServiceName, TaskDefinitionArn};

use super::error::DeployError;

/// How strictly the container hint must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerMatch {
    /// A container's image must contain the hint.
    Strict,
    /// Use the first container when none matches. Some scheduled tasks run
    /// an image whose name differs from the workload's logical name.
    FirstAsFallback,
}

/// Which container of a task definition a target deploys to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerSelection {
    Matched(usize),
    Fallback(usize),
}

impl ContainerSelection {
    pub fn index(&self) -> usize {
        match self {
            ContainerSelection::Matched(i) | ContainerSelection::Fallback(i) => *i,
        }
    }
}

/// Pick the container a hint refers to among sidecars.
///
/// Returns `None` when nothing matches under `Strict`, or when there are no
/// containers at all.
pub fn select_container(
    containers: &[ContainerDefinition],
    hint: &ContainerHint,
    policy: ContainerMatch,
) -> Option<ContainerSelection> {
    if let Some(index) = containers.iter().position(|c| hint.matches_image(&c.image)) {
        return Some(ContainerSelection::Matched(index));
    }
    match policy {
        ContainerMatch::Strict => None,
        ContainerMatch::FirstAsFallback if containers.is_empty() => None,
        ContainerMatch::FirstAsFallback => Some(ContainerSelection::Fallback(0)),
    }
}

/// Something bound to a task definition revision that can be repointed.
#[async_trait]
pub trait Target: fmt::Display + fmt::Debug + Clone + Send + Sync {
    /// Whatever `locate` learned that `repoint` needs.
    type Binding: fmt::Debug + Clone + Send + Sync;

    fn container_hint(&self) -> &ContainerHint;

    fn container_match(&self) -> ContainerMatch;

    /// Find the revision the target currently runs.
    async fn locate<P: FullPlatform>(
        &self,
        platform: &P,
    ) -> Result<(TaskDefinitionArn, Self::Binding), DeployError>;

    /// Point the target at `task_definition` in a single platform call.
    async fn repoint<P: FullPlatform>(
        &self,
        platform: &P,
        binding: &Self::Binding,
        task_definition: &TaskDefinitionArn,
    ) -> Result<ResponseMetadata, PlatformError>;
}

// =============================================================================
// Services
// =============================================================================

/// A long-running service in a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTarget {
    /// Hint naming the service's own container.
    #[serde(rename = "service")]
    pub container: ContainerHint,
    pub cluster_name: ClusterName,
    pub service_name: ServiceName,
}

impl ServiceTarget {
    pub fn new(container: ContainerHint, cluster_name: ClusterName, service_name: ServiceName) -> Self {
        Self {
            container,
            cluster_name,
            service_name,
        }
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service {}/{}", self.cluster_name, self.service_name)
    }
}

#[async_trait]
impl Target for ServiceTarget {
    type Binding = ClusterArn;

    fn container_hint(&self) -> &ContainerHint {
        &self.container
    }

    fn container_match(&self) -> ContainerMatch {
        ContainerMatch::Strict
    }

    async fn locate<P: FullPlatform>(
        &self,
        platform: &P,
    ) -> Result<(TaskDefinitionArn, ClusterArn), DeployError> {
        let service = platform
            .describe_service(&self.cluster_name, &self.service_name)
            .await
            .map_err(|e| match e {
                PlatformError::NotFound(_) => DeployError::TargetNotFound(self.to_string()),
                source => DeployError::Platform {
                    action: "describe service",
                    source,
                },
            })?;
        debug!(service_arn = %service.service_arn, "described service");
        Ok((service.task_definition, service.cluster_arn))
    }

    async fn repoint<P: FullPlatform>(
        &self,
        platform: &P,
        cluster: &ClusterArn,
        task_definition: &TaskDefinitionArn,
    ) -> Result<ResponseMetadata, PlatformError> {
        platform
            .update_service(cluster, &self.service_name, task_definition)
            .await
    }
}

// =============================================================================
// Scheduled tasks
// =============================================================================

/// A task launched on a schedule by a rule's target record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTaskTarget {
    #[serde(rename = "service")]
    pub container: ContainerHint,
    #[serde(rename = "cwRuleName")]
    pub rule_name: RuleName,
}

impl ScheduledTaskTarget {
    pub fn new(container: ContainerHint, rule_name: RuleName) -> Self {
        Self {
            container,
            rule_name,
        }
    }
}

impl fmt::Display for ScheduledTaskTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}", self.rule_name)
    }
}

#[async_trait]
impl Target for ScheduledTaskTarget {
    type Binding = RuleTarget;

    fn container_hint(&self) -> &ContainerHint {
        &self.container
    }

    fn container_match(&self) -> ContainerMatch {
        ContainerMatch::FirstAsFallback
    }

    /// Rules here carry exactly one target; only the first is read.
    async fn locate<P: FullPlatform>(
        &self,
        platform: &P,
    ) -> Result<(TaskDefinitionArn, RuleTarget), DeployError> {
        let targets = platform
            .list_targets_by_rule(&self.rule_name, 1)
            .await
            .map_err(|e| match e {
                PlatformError::NotFound(_) => DeployError::TargetNotFound(self.to_string()),
                source => DeployError::Platform {
                    action: "list rule targets",
                    source,
                },
            })?;

        let target = targets
            .into_iter()
            .next()
            .ok_or_else(|| DeployError::TargetNotFound(format!("{self} has no targets")))?;
        let task_definition = target
            .ecs_parameters
            .as_ref()
            .map(|p| p.task_definition_arn.clone())
            .ok_or_else(|| {
                DeployError::TargetNotFound(format!(
                    "{self} target {} has no task parameters",
                    target.id
                ))
            })?;
        debug!(target_id = %target.id, "read rule target");
        Ok((task_definition, target))
    }

    /// Resubmits the whole record with only the task definition swapped.
    async fn repoint<P: FullPlatform>(
        &self,
        platform: &P,
        target: &RuleTarget,
        task_definition: &TaskDefinitionArn,
    ) -> Result<ResponseMetadata, PlatformError> {
        let mut updated = target.clone();
        let parameters = updated.ecs_parameters.as_mut().ok_or_else(|| {
            PlatformError::InvalidRequest(format!("target {} has no task parameters", target.id))
        })?;
        parameters.task_definition_arn = task_definition.clone();
        platform
            .put_targets(&self.rule_name, std::slice::from_ref(&updated))
            .await
    }
}
