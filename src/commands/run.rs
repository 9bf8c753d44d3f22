// ABOUTME: Run command: every stage for every target of a release.
// ABOUTME: Prints a report and writes the platform snapshot back.

use super::{Context, read_input};
use taskroll::deploy::{Release, initialize};
use taskroll::error::{Error, Result};
use taskroll::orchestrator::run_release;
use taskroll::output::Output;

pub async fn run(ctx: &Context, input: &str, mut output: Output) -> Result<()> {
    output.start_timer();
    let release: Release = read_input(input)?;
    let role = ctx.config.deployment_role()?;
    let plan = initialize(release, &role)?;

    let (platform, path) = ctx.open_platform()?;
    let stages = ctx.stages(&platform)?;
    output.progress(&format!(
        "Releasing {} to {} target(s)",
        plan.release.as_deref().unwrap_or("image"),
        plan.target_count()
    ));

    let report = run_release(&stages, plan, &ctx.config.validation).await;
    platform.save(&path)?;
    output.report(&report);

    if report.is_success() {
        Ok(())
    } else {
        Err(Error::ReleaseFailed {
            failed: report.failures().count(),
            total: report.targets.len(),
        })
    }
}
