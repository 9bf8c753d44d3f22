// ABOUTME: Single-stage commands: init, deploy, task, and validate.
// ABOUTME: Each reads one JSON record and prints the record the next stage expects.

use super::{Context, read_input, write_output};
use taskroll::deploy::{
    DeployRecord, Deployment, Release, ScheduledTaskTarget, ServiceTarget, Target, WorkItem,
    initialize,
};
use taskroll::diagnostics::Diagnostics;
use taskroll::error::Result;
use taskroll::platform::MemoryPlatform;

/// Initializer stage. Does not touch the platform.
pub fn init(ctx: &Context, input: &str) -> Result<()> {
    let release: Release = read_input(input)?;
    let role = ctx.config.deployment_role()?;
    let plan = initialize(release, &role)?;
    write_output(&plan)
}

pub async fn deploy_service(ctx: &Context, input: &str) -> Result<()> {
    let item: WorkItem<ServiceTarget> = read_input(input)?;
    deploy(ctx, item).await
}

pub async fn deploy_task(ctx: &Context, input: &str) -> Result<()> {
    let item: WorkItem<ScheduledTaskTarget> = read_input(input)?;
    deploy(ctx, item).await
}

async fn deploy<T: Target + serde::Serialize>(ctx: &Context, item: WorkItem<T>) -> Result<()> {
    let (platform, path) = ctx.open_platform()?;
    let stages = ctx.stages(&platform)?;
    let mut diag = Diagnostics::default();

    let result = stages.deploy(item, &mut diag).await;
    // A registration may have happened even if the repoint failed.
    save(&platform, &path)?;
    let applied = result?;
    write_output(&applied.into_record())
}

pub async fn validate(ctx: &Context, input: &str) -> Result<()> {
    let record: DeployRecord<ServiceTarget> = read_input(input)?;
    let (platform, _) = ctx.open_platform()?;
    let stages = ctx.stages(&platform)?;
    let mut diag = Diagnostics::default();

    let validated = stages
        .validate(Deployment::from_record(record), &mut diag)
        .await
        .map_err(|(_, e)| e)?;
    write_output(&validated.into_record())
}

fn save(platform: &MemoryPlatform, path: &std::path::Path) -> Result<()> {
    platform.save(path)?;
    tracing::debug!(path = %path.display(), "saved platform snapshot");
    Ok(())
}
