// ABOUTME: In-process release runner chaining every stage for every target.
// ABOUTME: Targets run concurrently; validation is retried while services converge.

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RetryPolicy;
use crate::deploy::{Phase, ReleasePlan, ScheduledTaskTarget, ServiceTarget, WorkItem};
use crate::diagnostics::{Diagnostics, Warning};
use crate::platform::{Connect, IdentityOps};
use crate::stage::{StageError, Stages};
use crate::types::TaskDefinitionArn;

/// How one target ended up.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub target: String,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_task_definition: Option<TaskDefinitionArn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Validation attempts after the first one.
    #[serde(skip_serializing_if = "is_zero")]
    pub retries: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl TargetReport {
    fn failed(
        target: String,
        deployed_task_definition: Option<TaskDefinitionArn>,
        diag: Diagnostics,
        error: &StageError,
    ) -> Self {
        Self {
            target,
            phase: error.phase(),
            deployed_task_definition,
            warnings: diag.into_warnings(),
            error: Some(error.to_string()),
            retries: 0,
        }
    }

    /// Convergence still pending once the retry budget is spent is terminal.
    fn gave_up(
        target: String,
        deployed_task_definition: TaskDefinitionArn,
        diag: Diagnostics,
        error: &StageError,
        retries: u32,
    ) -> Self {
        Self {
            target,
            phase: Phase::Failed,
            deployed_task_definition: Some(deployed_task_definition),
            warnings: diag.into_warnings(),
            error: Some(format!("gave up after {retries} retries: {error}")),
            retries,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole release.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    pub targets: Vec<TargetReport>,
}

impl ReleaseReport {
    pub fn is_success(&self) -> bool {
        self.targets.iter().all(TargetReport::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TargetReport> {
        self.targets.iter().filter(|t| !t.is_success())
    }
}

/// Deploy every target of a plan, then validate every service.
///
/// A failing target never stops the others. Every target ends in a terminal
/// phase: a service that has not converged within `retry` is `Failed`.
pub async fn run_release<I: IdentityOps, C: Connect>(
    stages: &Stages<'_, I, C>,
    plan: ReleasePlan,
    retry: &RetryPolicy,
) -> ReleaseReport {
    info!(
        release = plan.release.as_deref().unwrap_or("-"),
        targets = plan.target_count(),
        "starting release"
    );

    let services = join_all(
        plan.services
            .into_iter()
            .map(|item| run_service(stages, item, retry)),
    );
    let tasks = join_all(plan.tasks.into_iter().map(|item| run_task(stages, item)));
    let (mut targets, task_reports) = futures::join!(services, tasks);
    targets.extend(task_reports);

    let report = ReleaseReport {
        release: plan.release,
        targets,
    };
    info!(success = report.is_success(), "release finished");
    report
}

async fn run_service<I: IdentityOps, C: Connect>(
    stages: &Stages<'_, I, C>,
    item: WorkItem<ServiceTarget>,
    retry: &RetryPolicy,
) -> TargetReport {
    let target = item.target.to_string();
    let mut diag = Diagnostics::default();

    let mut pending = match stages.deploy(item, &mut diag).await {
        Ok(applied) => applied,
        Err(e) => return TargetReport::failed(target, None, diag, &e),
    };
    let deployed = pending.outcome().deployed_task_definition.clone();

    let mut retries = 0;
    loop {
        match stages.validate(pending, &mut diag).await {
            Ok(validated) => {
                return TargetReport {
                    target,
                    phase: validated.state().phase(),
                    deployed_task_definition: Some(deployed),
                    warnings: diag.into_warnings(),
                    error: None,
                    retries,
                };
            }
            Err((_, e)) if !e.is_retryable() => {
                return TargetReport::failed(target, Some(deployed), diag, &e);
            }
            Err((deployment, e)) => match retry.delay_for_retry(retries + 1) {
                Some(delay) => {
                    retries += 1;
                    warn!(%target, retry = retries, ?delay, "service not converged yet, retrying");
                    tokio::time::sleep(delay).await;
                    pending = deployment;
                }
                None => {
                    warn!(%target, retries, "service did not converge, giving up");
                    return TargetReport::gave_up(target, deployed, diag, &e, retries);
                }
            },
        }
    }
}

async fn run_task<I: IdentityOps, C: Connect>(
    stages: &Stages<'_, I, C>,
    item: WorkItem<ScheduledTaskTarget>,
) -> TargetReport {
    let target = item.target.to_string();
    let mut diag = Diagnostics::default();
    match stages.deploy(item, &mut diag).await {
        Ok(applied) => TargetReport {
            target,
            phase: applied.state().phase(),
            deployed_task_definition: Some(applied.outcome().deployed_task_definition.clone()),
            warnings: diag.into_warnings(),
            error: None,
            retries: 0,
        },
        Err(e) => TargetReport::failed(target, None, diag, &e),
    }
}
