// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use tracing::{debug, info, warn};

use crate::platform::{FullPlatform, ListTasks, MAX_TASK_BATCH, TaskOps, TaskStatus};
use crate::types::TaskArn;

use super::Deployment;
use super::error::DeployError;
use super::record::DeployOutcome;
use super::state::{Applied, Initialized, Resolved, Validated};
use super::target::{ContainerSelection, ServiceTarget, Target, select_container};

/// Result type for transitions whose failure the caller may want to retry.
pub type TransitionResult<T, S, U> = Result<Deployment<T, U>, (Deployment<T, S>, DeployError)>;

impl<T, S> Deployment<T, S> {
    /// Internal helper to move to the next state.
    fn transition<U>(self, state: U) -> Deployment<T, U> {
        Deployment {
            item: self.item,
            state,
        }
    }
}

// =============================================================================
// Initialized -> Resolved
// =============================================================================

impl<T: Target> Deployment<T, Initialized> {
    /// Find the task definition and container the target currently runs.
    ///
    /// Read-only.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::TargetNotFound` if the target does not exist and
    /// `DeployError::ContainerNotFound` if no container fits the hint under
    /// the target's matching policy.
    #[must_use = "deployment state must be used"]
    pub async fn resolve<P: FullPlatform>(
        self,
        platform: &P,
    ) -> Result<Deployment<T, Resolved<T::Binding>>, DeployError> {
        let target = &self.item.target;
        info!(%target, "retrieving current task definition");
        let (arn, binding) = target.locate(platform).await?;
        info!(%target, task_definition = %arn, "current task definition");

        let task_definition = platform
            .describe_task_definition(&arn)
            .await
            .map_err(DeployError::platform("describe task definition"))?;
        debug!(containers = ?task_definition.containers(), "container definitions");

        let hint = target.container_hint();
        let selection = select_container(task_definition.containers(), hint, target.container_match())
            .ok_or_else(|| DeployError::ContainerNotFound {
                hint: hint.to_string(),
                task_definition: arn.clone(),
            })?;

        let fallback = matches!(selection, ContainerSelection::Fallback(_));
        if fallback {
            debug!(%target, %hint, "no container image matches the hint, using the first container");
        }

        let resolved = Resolved {
            container: selection.index(),
            task_definition,
            fallback,
            binding,
        };
        info!(%target, image = %resolved.task_definition.containers()[resolved.container].image, "current image");
        Ok(self.transition(resolved))
    }
}

// =============================================================================
// Resolved -> Applied
// =============================================================================

impl<T: Target> Deployment<T, Resolved<T::Binding>> {
    /// Roll the desired image out to the target if it does not run it yet.
    ///
    /// When the current image already equals the desired one nothing is
    /// registered and the outcome echoes the current revision. Otherwise a
    /// new revision identical to the current one except for the selected
    /// container's image is registered and the target is repointed at it.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::DeploymentApply` if the repoint call comes back
    /// with a non-success status.
    #[must_use = "deployment state must be used"]
    pub async fn apply<P: FullPlatform>(
        self,
        platform: &P,
    ) -> Result<Deployment<T, Applied>, DeployError> {
        let target = &self.item.target;
        let current = self.current_image().to_string();
        let previous = self.state.task_definition.task_definition_arn.clone();
        info!(%target, current = %current, desired = %self.item.image, "comparing images");

        if self.item.image.matches(&current) {
            info!(%target, "image matches, no new deployment needed");
            let outcome = DeployOutcome {
                previous_image: current,
                previous_task_definition: previous.clone(),
                deployed_task_definition: previous,
                deployment_needed: false,
            };
            return Ok(self.transition(Applied { outcome }));
        }

        info!(%target, image = %self.item.image, "image differs, registering new task definition");
        let request = self
            .state
            .task_definition
            .with_image(self.state.container, self.item.image.as_str())
            .ok_or_else(|| DeployError::ContainerNotFound {
                hint: target.container_hint().to_string(),
                task_definition: previous.clone(),
            })?;
        let registered = platform
            .register_task_definition(&request)
            .await
            .map_err(DeployError::platform("register task definition"))?;
        let deployed = registered.task_definition_arn;
        info!(%target, task_definition = %deployed, "registered task definition");

        let response = target
            .repoint(platform, &self.state.binding, &deployed)
            .await
            .map_err(DeployError::platform("repoint target"))?;
        debug!(?response, "repoint response");
        if !response.is_success() {
            return Err(DeployError::DeploymentApply {
                target: target.to_string(),
                task_definition: deployed,
                status: response.http_status_code,
            });
        }
        info!(%target, task_definition = %deployed, "target repointed");

        let outcome = DeployOutcome {
            previous_image: current,
            previous_task_definition: previous,
            deployed_task_definition: deployed,
            deployment_needed: true,
        };
        Ok(self.transition(Applied { outcome }))
    }
}

// =============================================================================
// Applied -> Validated (services only)
// =============================================================================

impl Deployment<ServiceTarget, Applied> {
    /// Check that every running task of the service uses the deployed revision.
    ///
    /// Does not wait: a service still rolling fails with a retryable error and
    /// the caller decides when to look again. A service with no running tasks
    /// counts as scaled to zero and passes with a warning.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` so the same deployment can be validated again.
    /// `DeployError::Convergence` is the retryable case.
    #[must_use = "deployment state must be used"]
    pub async fn validate<P: TaskOps>(
        self,
        platform: &P,
    ) -> TransitionResult<ServiceTarget, Applied, Validated> {
        let this = match self.finish_unchanged() {
            Ok(done) => return Ok(done),
            Err(this) => this,
        };
        this.check_convergence(platform).await
    }

    /// Settle a deployment that rolled nothing out, without asking the platform.
    ///
    /// Hands `self` back untouched when a new revision was deployed.
    pub fn finish_unchanged(self) -> Result<Deployment<ServiceTarget, Validated>, Self> {
        if self.state.outcome.deployment_needed {
            return Err(self);
        }
        info!(target = %self.item.target, "no deployment needed, skipping validation");
        let outcome = self.state.outcome.clone();
        Ok(self.transition(Validated {
            outcome,
            deployed: false,
            warning: None,
        }))
    }

    async fn check_convergence<P: TaskOps>(
        self,
        platform: &P,
    ) -> TransitionResult<ServiceTarget, Applied, Validated> {
        let outcome = self.state.outcome.clone();
        match self.check_running_tasks(platform).await {
            Ok(None) => {
                let message = format!(
                    "No running task found for service: {}",
                    self.item.target.service_name
                );
                warn!(target = %self.item.target, "no running tasks, assuming the service is scaled to zero");
                Ok(self.transition(Validated {
                    outcome,
                    deployed: false,
                    warning: Some(message),
                }))
            }
            Ok(Some(count)) => {
                info!(target = %self.item.target, tasks = count, "all running tasks use the new task definition");
                Ok(self.transition(Validated {
                    outcome,
                    deployed: true,
                    warning: None,
                }))
            }
            Err(e) => Err((self, e)),
        }
    }

    /// Returns the number of tasks checked, or `None` if none are running.
    async fn check_running_tasks<P: TaskOps>(&self, platform: &P) -> Result<Option<usize>, DeployError> {
        let target = &self.item.target;
        let expected = &self.state.outcome.deployed_task_definition;

        let running = list_running_tasks(platform, target).await?;
        info!(%target, tasks = running.len(), "currently running tasks");
        if running.is_empty() {
            return Ok(None);
        }

        for batch in running.chunks(MAX_TASK_BATCH) {
            let described = platform
                .describe_tasks(&target.cluster_name, batch)
                .await
                .map_err(DeployError::platform("describe tasks"))?;
            if let Some(stale) = described
                .iter()
                .find(|task| task.task_definition_arn != *expected)
            {
                return Err(DeployError::Convergence {
                    service: target.to_string(),
                    found: stale.task_definition_arn.clone(),
                    expected: expected.clone(),
                });
            }
        }
        Ok(Some(running.len()))
    }
}

/// Collect every running task ARN of a service, following pagination.
async fn list_running_tasks<P: TaskOps>(
    platform: &P,
    target: &ServiceTarget,
) -> Result<Vec<TaskArn>, DeployError> {
    let mut request = ListTasks {
        cluster: &target.cluster_name,
        service: &target.service_name,
        desired_status: TaskStatus::Running,
        max_results: MAX_TASK_BATCH as u32,
        next_token: None,
    };
    let mut arns = Vec::new();
    loop {
        let page = platform
            .list_tasks(&request)
            .await
            .map_err(DeployError::platform("list tasks"))?;
        arns.extend(page.task_arns);
        match page.next_token {
            Some(token) => request.next_token = Some(token),
            None => return Ok(arns),
        }
    }
}
