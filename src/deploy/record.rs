// ABOUTME: Typed records exchanged with an external step orchestrator.
// ABOUTME: One struct per stage boundary, serialized as flat camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::types::TaskDefinitionArn;

use super::release::WorkItem;
use super::target::ServiceTarget;

/// What the deploy stage did to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutcome {
    /// Image the target ran before this deployment.
    pub previous_image: String,

    #[serde(rename = "previousTaskDefArn")]
    pub previous_task_definition: TaskDefinitionArn,

    /// Equal to `previous_task_definition` when nothing changed.
    #[serde(rename = "deployedTaskDefArn")]
    pub deployed_task_definition: TaskDefinitionArn,

    pub deployment_needed: bool,
}

/// Output of the deploy stage, input of the validate stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployRecord<T> {
    #[serde(flatten)]
    pub item: WorkItem<T>,

    #[serde(flatten)]
    pub outcome: DeployOutcome,
}

/// Output of the validate stage.
///
/// Has no `deploymentNeeded` field; validation consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRecord {
    #[serde(flatten)]
    pub item: WorkItem<ServiceTarget>,

    pub previous_image: String,

    #[serde(rename = "previousTaskDefArn")]
    pub previous_task_definition: TaskDefinitionArn,

    #[serde(rename = "deployedTaskDefArn")]
    pub deployed_task_definition: TaskDefinitionArn,

    /// True only when a new revision was rolled out and every running task uses it.
    pub deployed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
