// ABOUTME: Shared platform resource shapes used across capability traits.
// ABOUTME: Task definitions, services, rule targets, running tasks, and credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::types::{ClusterArn, ClusterName, RoleArn, ServiceArn, ServiceName, TaskArn, TaskDefinitionArn};

// =============================================================================
// Task definitions
// =============================================================================

/// One container inside a task definition.
///
/// Only `name` and `image` are interpreted. Every other attribute (port
/// mappings, environment, log configuration, ...) is carried through
/// `attributes` untouched so a re-registration reproduces it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ContainerDefinition {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            attributes: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    Bridge,
    Host,
    Awsvpc,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Compatibility {
    Ec2,
    Fargate,
    External,
}

/// A task-level volume; the source configuration is opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementConstraint {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// Registration request for a new task definition revision.
///
/// Every field the platform would otherwise reset to a default is present,
/// which is what makes a derived revision differ from its source only where
/// the caller changed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTaskDefinition {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<RoleArn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<RoleArn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<NetworkMode>,
    pub container_definitions: Vec<ContainerDefinition>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub placement_constraints: Vec<PlacementConstraint>,
    #[serde(default)]
    pub requires_compatibilities: Vec<Compatibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// An immutable, revisioned task definition as described by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub task_definition_arn: TaskDefinitionArn,
    pub revision: u32,
    #[serde(flatten)]
    pub spec: RegisterTaskDefinition,
}

impl TaskDefinition {
    pub fn family(&self) -> &str {
        &self.spec.family
    }

    pub fn containers(&self) -> &[ContainerDefinition] {
        &self.spec.container_definitions
    }

    /// A registration request for a copy of this revision with one
    /// container's image replaced. Returns `None` if `index` is out of range.
    pub fn with_image(&self, index: usize, image: &str) -> Option<RegisterTaskDefinition> {
        let mut request = self.spec.clone();
        request.container_definitions.get_mut(index)?.image = image.to_string();
        Some(request)
    }
}

// =============================================================================
// Services and tasks
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub service_arn: ServiceArn,
    pub cluster_arn: ClusterArn,
    pub service_name: String,
    pub task_definition: TaskDefinitionArn,
    pub desired_count: u32,
    pub running_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Provisioning,
    Pending,
    Activating,
    Running,
    Deactivating,
    Stopping,
    Deprovisioning,
    Stopped,
}

/// A live task started by a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTask {
    pub task_arn: TaskArn,
    pub task_definition_arn: TaskDefinitionArn,
    pub last_status: TaskStatus,
    pub desired_status: TaskStatus,
}

/// Parameters for one page of a task listing.
#[derive(Debug, Clone)]
pub struct ListTasks<'a> {
    pub cluster: &'a ClusterName,
    pub service: &'a ServiceName,
    pub desired_status: TaskStatus,
    pub max_results: u32,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPage {
    pub task_arns: Vec<TaskArn>,
    pub next_token: Option<String>,
}

// =============================================================================
// Schedule rules
// =============================================================================

/// Task launch parameters embedded in a rule target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EcsParameters {
    pub task_definition_arn: TaskDefinitionArn,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A target record attached to a schedule rule.
///
/// Updating a target means resubmitting the whole record, so everything
/// the platform returned is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleTarget {
    pub id: String,
    pub arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<RoleArn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecs_parameters: Option<EcsParameters>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Responses and identity
// =============================================================================

/// Status envelope of a mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub http_status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ResponseMetadata {
    pub fn ok() -> Self {
        Self {
            http_status_code: 200,
            request_id: None,
        }
    }

    /// Only an explicit 200 counts as success.
    pub fn is_success(&self) -> bool {
        self.http_status_code == 200
    }
}

/// Role session requested from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub name: String,
    pub duration: Duration,
}

/// Short-lived credentials for an assumed role.
#[derive(Clone)]
pub struct Credentials {
    pub role: RoleArn,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl Credentials {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expiration
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("role", &self.role)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}
