// ABOUTME: In-memory orchestration platform backed by a serializable snapshot.
// ABOUTME: Used to rehearse releases against a YAML state file and as the test double.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::traits::{Connect, IdentityOps, RuleOps, ServiceOps, TaskDefinitionOps, TaskOps, MAX_TASK_BATCH};
use super::{
    Credentials, ListTasks, PlatformError, RegisterTaskDefinition, ResponseMetadata, RuleTarget,
    RunningTask, Service, SessionSpec, TaskDefinition, TaskPage, TaskStatus,
};
use crate::error::Result;
use crate::types::{
    ClusterArn, ClusterName, RoleArn, RuleName, ServiceArn, ServiceName, TaskArn, TaskDefinitionArn,
};

// =============================================================================
// Snapshot
// =============================================================================

/// Complete platform state, as stored in a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSnapshot {
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_account_id")]
    pub account_id: String,

    /// Roles that may be assumed. Empty means any role.
    #[serde(default)]
    pub roles: Vec<RoleArn>,

    /// Replace a service's tasks as soon as it is repointed, as if the
    /// rolling update finished instantly.
    #[serde(default = "default_true")]
    pub converge_on_update: bool,

    #[serde(default)]
    pub task_definitions: Vec<TaskDefinition>,

    #[serde(default)]
    pub clusters: Vec<ClusterState>,

    #[serde(default)]
    pub rules: Vec<RuleState>,
}

fn default_region() -> String {
    "eu-west-1".to_string()
}

fn default_account_id() -> String {
    "000000000000".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PlatformSnapshot {
    fn default() -> Self {
        Self {
            region: default_region(),
            account_id: default_account_id(),
            roles: Vec::new(),
            converge_on_update: true,
            task_definitions: Vec::new(),
            clusters: Vec::new(),
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterState {
    pub name: String,
    #[serde(default)]
    pub services: Vec<ServiceState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceState {
    pub name: String,
    pub task_definition: TaskDefinitionArn,
    #[serde(default)]
    pub desired_count: u32,
    #[serde(default)]
    pub tasks: Vec<RunningTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleState {
    pub name: String,
    #[serde(default)]
    pub targets: Vec<RuleTarget>,
}

// =============================================================================
// MemoryPlatform
// =============================================================================

#[derive(Debug, Default)]
struct Inner {
    snapshot: PlatformSnapshot,
    forced_status: Option<u16>,
    registrations: usize,
    task_counter: u64,
}

/// Platform held entirely in memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlatform {
    inner: Arc<Mutex<Inner>>,
}

/// Clusters are addressed by name or by ARN.
fn cluster_key(cluster: &str) -> &str {
    cluster.rsplit_once('/').map(|(_, name)| name).unwrap_or(cluster)
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: PlatformSnapshot) -> Self {
        let task_counter = snapshot
            .clusters
            .iter()
            .flat_map(|c| &c.services)
            .map(|s| s.tasks.len() as u64)
            .sum();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                snapshot,
                task_counter,
                ..Inner::default()
            })),
        }
    }

    /// Load a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: PlatformSnapshot = serde_yaml::from_str(&content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current state back to a snapshot file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.snapshot())?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn snapshot(&self) -> PlatformSnapshot {
        self.inner.lock().snapshot.clone()
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    /// Register a task definition directly, bypassing the trait.
    pub fn seed_task_definition(&self, request: RegisterTaskDefinition) -> TaskDefinition {
        let mut inner = self.inner.lock();
        inner.register(request)
    }

    /// Create a service with `running` tasks on `task_definition`.
    pub fn seed_service(
        &self,
        cluster: &str,
        service: &str,
        task_definition: &TaskDefinitionArn,
        running: u32,
    ) {
        let mut inner = self.inner.lock();
        let tasks = (0..running)
            .map(|_| inner.new_task(cluster, task_definition))
            .collect();
        let state = ServiceState {
            name: service.to_string(),
            task_definition: task_definition.clone(),
            desired_count: running,
            tasks,
        };
        let key = cluster_key(cluster);
        let clusters = &mut inner.snapshot.clusters;
        match clusters.iter_mut().find(|c| c.name == key) {
            Some(existing) => {
                existing.services.retain(|s| s.name != service);
                existing.services.push(state);
            }
            None => clusters.push(ClusterState {
                name: key.to_string(),
                services: vec![state],
            }),
        }
    }

    /// Attach a target record to a rule, creating the rule if needed.
    pub fn seed_rule(&self, rule: &str, target: RuleTarget) {
        let mut inner = self.inner.lock();
        let rules = &mut inner.snapshot.rules;
        match rules.iter_mut().find(|r| r.name == rule) {
            Some(existing) => existing.targets.push(target),
            None => rules.push(RuleState {
                name: rule.to_string(),
                targets: vec![target],
            }),
        }
    }

    /// Restrict which roles may be assumed.
    pub fn allow_role(&self, role: RoleArn) {
        self.inner.lock().snapshot.roles.push(role);
    }

    pub fn set_converge_on_update(&self, converge: bool) {
        self.inner.lock().snapshot.converge_on_update = converge;
    }

    /// Answer every later mutation with this status instead of applying it.
    pub fn force_status(&self, status: Option<u16>) {
        self.inner.lock().forced_status = status;
    }

    /// Replace a service's tasks with `count` tasks per listed revision.
    pub fn set_running_tasks(&self, cluster: &str, service: &str, revisions: &[TaskDefinitionArn]) {
        let mut inner = self.inner.lock();
        let tasks: Vec<RunningTask> = revisions
            .iter()
            .map(|arn| inner.new_task(cluster, arn))
            .collect();
        if let Some(state) = inner.service_mut(cluster, service) {
            state.tasks = tasks;
        }
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Number of revisions registered through `TaskDefinitionOps`.
    pub fn registrations(&self) -> usize {
        self.inner.lock().registrations
    }

    pub fn task_definition(&self, arn: &TaskDefinitionArn) -> Option<TaskDefinition> {
        self.inner.lock().find_task_definition(arn).cloned()
    }

    pub fn service_task_definition(&self, cluster: &str, service: &str) -> Option<TaskDefinitionArn> {
        let mut inner = self.inner.lock();
        inner
            .service_mut(cluster, service)
            .map(|s| s.task_definition.clone())
    }

    pub fn rule_targets(&self, rule: &str) -> Vec<RuleTarget> {
        self.inner
            .lock()
            .snapshot
            .rules
            .iter()
            .find(|r| r.name == rule)
            .map(|r| r.targets.clone())
            .unwrap_or_default()
    }
}

impl Inner {
    fn arn_prefix(&self) -> String {
        format!(
            "arn:aws:ecs:{}:{}",
            self.snapshot.region, self.snapshot.account_id
        )
    }

    fn register(&mut self, request: RegisterTaskDefinition) -> TaskDefinition {
        let revision = self
            .snapshot
            .task_definitions
            .iter()
            .filter(|d| d.family() == request.family)
            .map(|d| d.revision)
            .max()
            .unwrap_or(0)
            + 1;
        let arn = TaskDefinitionArn::new(format!(
            "{}:task-definition/{}:{}",
            self.arn_prefix(),
            request.family,
            revision
        ));
        let definition = TaskDefinition {
            task_definition_arn: arn,
            revision,
            spec: request,
        };
        self.snapshot.task_definitions.push(definition.clone());
        definition
    }

    fn find_task_definition(&self, arn: &TaskDefinitionArn) -> Option<&TaskDefinition> {
        // Short `family:revision` references resolve like full ARNs.
        self.snapshot
            .task_definitions
            .iter()
            .find(|d| d.task_definition_arn == *arn || d.task_definition_arn.resource() == arn.as_str())
    }

    fn new_task(&mut self, cluster: &str, task_definition: &TaskDefinitionArn) -> RunningTask {
        self.task_counter += 1;
        RunningTask {
            task_arn: TaskArn::new(format!(
                "{}:task/{}/{:032x}",
                self.arn_prefix(),
                cluster_key(cluster),
                self.task_counter
            )),
            task_definition_arn: task_definition.clone(),
            last_status: TaskStatus::Running,
            desired_status: TaskStatus::Running,
        }
    }

    fn service_mut(&mut self, cluster: &str, service: &str) -> Option<&mut ServiceState> {
        let cluster = cluster_key(cluster);
        self.snapshot
            .clusters
            .iter_mut()
            .find(|c| c.name == cluster)?
            .services
            .iter_mut()
            .find(|s| s.name == service)
    }

    fn cluster_tasks(&self, cluster: &str) -> impl Iterator<Item = &RunningTask> {
        let cluster = cluster_key(cluster);
        self.snapshot
            .clusters
            .iter()
            .filter(move |c| c.name == cluster)
            .flat_map(|c| &c.services)
            .flat_map(|s| &s.tasks)
    }

    fn forced(&self) -> Option<ResponseMetadata> {
        self.forced_status.map(|code| ResponseMetadata {
            http_status_code: code,
            request_id: None,
        })
    }
}

// =============================================================================
// Capability implementations
// =============================================================================

#[async_trait]
impl ServiceOps for MemoryPlatform {
    async fn describe_service(
        &self,
        cluster: &ClusterName,
        service: &ServiceName,
    ) -> std::result::Result<Service, PlatformError> {
        let mut inner = self.inner.lock();
        let prefix = inner.arn_prefix();
        let key = cluster_key(cluster.as_str()).to_string();
        let state = inner
            .service_mut(cluster.as_str(), service.as_str())
            .ok_or_else(|| PlatformError::NotFound(format!("service {service} in cluster {cluster}")))?;
        let running_count = state
            .tasks
            .iter()
            .filter(|t| t.last_status == TaskStatus::Running)
            .count() as u32;

        Ok(Service {
            service_arn: ServiceArn::new(format!("{prefix}:service/{key}/{}", state.name)),
            cluster_arn: ClusterArn::new(format!("{prefix}:cluster/{key}")),
            service_name: state.name.clone(),
            task_definition: state.task_definition.clone(),
            desired_count: state.desired_count,
            running_count,
        })
    }

    async fn update_service(
        &self,
        cluster: &ClusterArn,
        service: &ServiceName,
        task_definition: &TaskDefinitionArn,
    ) -> std::result::Result<ResponseMetadata, PlatformError> {
        let mut inner = self.inner.lock();
        if let Some(forced) = inner.forced() {
            return Ok(forced);
        }

        let definition = inner
            .find_task_definition(task_definition)
            .map(|d| d.task_definition_arn.clone())
            .ok_or_else(|| PlatformError::InvalidRequest(format!("unknown task definition {task_definition}")))?;
        let converge = inner.snapshot.converge_on_update;

        let desired = {
            let state = inner
                .service_mut(cluster.as_str(), service.as_str())
                .ok_or_else(|| PlatformError::NotFound(format!("service {service} in cluster {cluster}")))?;
            state.task_definition = definition.clone();
            state.desired_count
        };

        if converge {
            let tasks: Vec<RunningTask> = (0..desired)
                .map(|_| inner.new_task(cluster.as_str(), &definition))
                .collect();
            if let Some(state) = inner.service_mut(cluster.as_str(), service.as_str()) {
                state.tasks = tasks;
            }
        }

        Ok(ResponseMetadata::ok())
    }
}

#[async_trait]
impl TaskDefinitionOps for MemoryPlatform {
    async fn describe_task_definition(
        &self,
        task_definition: &TaskDefinitionArn,
    ) -> std::result::Result<TaskDefinition, PlatformError> {
        self.inner
            .lock()
            .find_task_definition(task_definition)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("task definition {task_definition}")))
    }

    async fn register_task_definition(
        &self,
        request: &RegisterTaskDefinition,
    ) -> std::result::Result<TaskDefinition, PlatformError> {
        if request.family.is_empty() {
            return Err(PlatformError::InvalidRequest("family is required".to_string()));
        }
        if request.container_definitions.is_empty() {
            return Err(PlatformError::InvalidRequest(
                "at least one container definition is required".to_string(),
            ));
        }
        let mut inner = self.inner.lock();
        inner.registrations += 1;
        Ok(inner.register(request.clone()))
    }
}

#[async_trait]
impl TaskOps for MemoryPlatform {
    async fn list_tasks(&self, request: &ListTasks<'_>) -> std::result::Result<TaskPage, PlatformError> {
        if request.max_results == 0 || request.max_results as usize > MAX_TASK_BATCH {
            return Err(PlatformError::InvalidRequest(format!(
                "max_results must be between 1 and {MAX_TASK_BATCH}"
            )));
        }
        let offset = match &request.next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| PlatformError::InvalidRequest(format!("invalid next token {token}")))?,
            None => 0,
        };

        let mut inner = self.inner.lock();
        let state = inner
            .service_mut(request.cluster.as_str(), request.service.as_str())
            .ok_or_else(|| {
                PlatformError::NotFound(format!(
                    "service {} in cluster {}",
                    request.service, request.cluster
                ))
            })?;
        let matching: Vec<TaskArn> = state
            .tasks
            .iter()
            .filter(|t| t.desired_status == request.desired_status)
            .map(|t| t.task_arn.clone())
            .collect();

        let end = (offset + request.max_results as usize).min(matching.len());
        let task_arns = matching.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_token = (end < matching.len()).then(|| end.to_string());
        Ok(TaskPage {
            task_arns,
            next_token,
        })
    }

    async fn describe_tasks(
        &self,
        cluster: &ClusterName,
        tasks: &[TaskArn],
    ) -> std::result::Result<Vec<RunningTask>, PlatformError> {
        if tasks.is_empty() || tasks.len() > MAX_TASK_BATCH {
            return Err(PlatformError::InvalidRequest(format!(
                "between 1 and {MAX_TASK_BATCH} tasks may be described at once"
            )));
        }
        let inner = self.inner.lock();
        Ok(inner
            .cluster_tasks(cluster.as_str())
            .filter(|t| tasks.contains(&t.task_arn))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RuleOps for MemoryPlatform {
    async fn list_targets_by_rule(
        &self,
        rule: &RuleName,
        limit: u32,
    ) -> std::result::Result<Vec<RuleTarget>, PlatformError> {
        let inner = self.inner.lock();
        let state = inner
            .snapshot
            .rules
            .iter()
            .find(|r| r.name == rule.as_str())
            .ok_or_else(|| PlatformError::NotFound(format!("rule {rule}")))?;
        Ok(state.targets.iter().take(limit as usize).cloned().collect())
    }

    async fn put_targets(
        &self,
        rule: &RuleName,
        targets: &[RuleTarget],
    ) -> std::result::Result<ResponseMetadata, PlatformError> {
        let mut inner = self.inner.lock();
        if let Some(forced) = inner.forced() {
            return Ok(forced);
        }
        let state = inner
            .snapshot
            .rules
            .iter_mut()
            .find(|r| r.name == rule.as_str())
            .ok_or_else(|| PlatformError::NotFound(format!("rule {rule}")))?;

        for target in targets {
            match state.targets.iter_mut().find(|t| t.id == target.id) {
                Some(existing) => *existing = target.clone(),
                None => state.targets.push(target.clone()),
            }
        }
        Ok(ResponseMetadata::ok())
    }
}

#[async_trait]
impl IdentityOps for MemoryPlatform {
    async fn assume_role(
        &self,
        role: &RoleArn,
        session: &SessionSpec,
    ) -> std::result::Result<Credentials, PlatformError> {
        let valid_name = (2..=64).contains(&session.name.len())
            && session
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "_+=,.@-".contains(c));
        if !valid_name {
            return Err(PlatformError::InvalidRequest(format!(
                "invalid role session name {:?}",
                session.name
            )));
        }

        let inner = self.inner.lock();
        if !inner.snapshot.roles.is_empty() && !inner.snapshot.roles.contains(role) {
            return Err(PlatformError::AccessDenied(format!("cannot assume {role}")));
        }

        let duration = chrono::Duration::from_std(session.duration)
            .map_err(|e| PlatformError::InvalidRequest(format!("session duration: {e}")))?;
        Ok(Credentials {
            role: role.clone(),
            access_key_id: format!("ASIA{:016X}", inner.task_counter),
            secret_access_key: "memory-secret".to_string(),
            session_token: format!("memory-session-{}", session.name),
            expiration: Utc::now() + duration,
        })
    }
}

impl Connect for MemoryPlatform {
    type Client = MemoryPlatform;

    fn connect(&self, credentials: &Credentials) -> std::result::Result<Self::Client, PlatformError> {
        if credentials.is_expired() {
            return Err(PlatformError::ExpiredCredentials(credentials.expiration));
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ContainerDefinition;
    use std::time::Duration;

    fn registration(family: &str, image: &str) -> RegisterTaskDefinition {
        RegisterTaskDefinition {
            family: family.to_string(),
            task_role_arn: None,
            execution_role_arn: None,
            network_mode: None,
            container_definitions: vec![ContainerDefinition::new(family, image)],
            volumes: vec![],
            placement_constraints: vec![],
            requires_compatibilities: vec![],
            cpu: None,
            memory: None,
        }
    }

    #[tokio::test]
    async fn registration_increments_revision_per_family() {
        let platform = MemoryPlatform::new();
        let first = platform
            .register_task_definition(&registration("web", "x/web:1"))
            .await
            .unwrap();
        let second = platform
            .register_task_definition(&registration("web", "x/web:2"))
            .await
            .unwrap();
        let other = platform
            .register_task_definition(&registration("jobs", "x/jobs:1"))
            .await
            .unwrap();

        assert_eq!(first.revision, 1);
        assert_eq!(second.revision, 2);
        assert_eq!(other.revision, 1);
        assert!(second.task_definition_arn.as_str().ends_with("task-definition/web:2"));
        assert_eq!(platform.registrations(), 3);
    }

    #[tokio::test]
    async fn short_reference_resolves() {
        let platform = MemoryPlatform::new();
        platform.seed_task_definition(registration("web", "x/web:1"));
        let found = platform
            .describe_task_definition(&TaskDefinitionArn::new("web:1"))
            .await
            .unwrap();
        assert_eq!(found.revision, 1);
    }

    #[tokio::test]
    async fn list_tasks_paginates() {
        let platform = MemoryPlatform::new();
        let def = platform.seed_task_definition(registration("web", "x/web:1"));
        platform.seed_service("prod", "web", &def.task_definition_arn, 5);

        let cluster = ClusterName::new("prod").unwrap();
        let service = ServiceName::new("web").unwrap();
        let mut request = ListTasks {
            cluster: &cluster,
            service: &service,
            desired_status: TaskStatus::Running,
            max_results: 2,
            next_token: None,
        };

        let mut seen = Vec::new();
        loop {
            let page = platform.list_tasks(&request).await.unwrap();
            assert!(page.task_arns.len() <= 2);
            seen.extend(page.task_arns);
            match page.next_token {
                Some(token) => request.next_token = Some(token),
                None => break,
            }
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn seeding_by_cluster_arn_reuses_the_cluster() {
        let platform = MemoryPlatform::new();
        let def = platform.seed_task_definition(registration("web", "x/web:1"));
        platform.seed_service("prod", "web", &def.task_definition_arn, 1);
        platform.seed_service(
            "arn:aws:ecs:eu-west-1:123456789012:cluster/prod",
            "worker",
            &def.task_definition_arn,
            1,
        );

        let clusters = platform.snapshot().clusters;
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].name, "prod");
        assert_eq!(clusters[0].services.len(), 2);
        assert!(platform.service_task_definition("prod", "worker").is_some());
    }

    #[tokio::test]
    async fn forced_status_leaves_service_untouched() {
        let platform = MemoryPlatform::new();
        let v1 = platform.seed_task_definition(registration("web", "x/web:1"));
        let v2 = platform.seed_task_definition(registration("web", "x/web:2"));
        platform.seed_service("prod", "web", &v1.task_definition_arn, 1);
        platform.force_status(Some(500));

        let service = ServiceName::new("web").unwrap();
        let response = platform
            .update_service(&ClusterArn::new("prod"), &service, &v2.task_definition_arn)
            .await
            .unwrap();

        assert_eq!(response.http_status_code, 500);
        assert_eq!(
            platform.service_task_definition("prod", "web"),
            Some(v1.task_definition_arn)
        );
    }

    #[tokio::test]
    async fn assume_role_respects_allow_list() {
        let platform = MemoryPlatform::new();
        platform.allow_role(RoleArn::new("arn:aws:iam::1:role/deploy"));
        let session = SessionSpec {
            name: "taskroll-test".to_string(),
            duration: Duration::from_secs(900),
        };

        let denied = platform
            .assume_role(&RoleArn::new("arn:aws:iam::1:role/other"), &session)
            .await;
        assert!(matches!(denied, Err(PlatformError::AccessDenied(_))));

        let creds = platform
            .assume_role(&RoleArn::new("arn:aws:iam::1:role/deploy"), &session)
            .await
            .unwrap();
        assert!(!creds.is_expired());
        assert!(platform.connect(&creds).is_ok());
    }

    #[test]
    fn expired_credentials_cannot_connect() {
        let platform = MemoryPlatform::new();
        let creds = Credentials {
            role: RoleArn::new("arn:aws:iam::1:role/deploy"),
            access_key_id: "a".to_string(),
            secret_access_key: "b".to_string(),
            session_token: "c".to_string(),
            expiration: Utc::now() - chrono::Duration::minutes(1),
        };
        assert!(matches!(
            platform.connect(&creds),
            Err(PlatformError::ExpiredCredentials(_))
        ));
    }

    #[test]
    fn snapshot_round_trips_through_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("platform.yml");
        let platform = MemoryPlatform::new();
        let def = platform.seed_task_definition(registration("web", "x/web:1"));
        platform.seed_service("prod", "web", &def.task_definition_arn, 2);
        platform.save(&path).unwrap();

        let reloaded = MemoryPlatform::load(&path).unwrap();
        assert_eq!(reloaded.snapshot(), platform.snapshot());
    }
}
