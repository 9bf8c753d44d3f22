// ABOUTME: Tests for the validation stage on services.
// ABOUTME: Covers convergence, pending rollouts, scaled-to-zero services, and task pagination.

mod support;

use std::io;
use std::sync::{Arc, Mutex};

use support::{CLUSTER, container, seed_service, service_target, work_item};
use taskroll::deploy::{Applied, DeployError, Deployment, Phase, ServiceTarget};
use taskroll::platform::MemoryPlatform;

async fn deployed(
    platform: &MemoryPlatform,
    from: &str,
    to: &str,
    running: u32,
) -> Deployment<ServiceTarget, Applied> {
    seed_service(platform, "web", vec![container("web", from)], running);
    Deployment::new(work_item(service_target("app", "web"), to))
        .resolve(platform)
        .await
        .unwrap()
        .apply(platform)
        .await
        .unwrap()
}

#[tokio::test]
async fn converged_service_is_deployed() {
    support::init_tracing();
    let platform = MemoryPlatform::new();
    let applied = deployed(&platform, "x/app:2", "x/app:3", 2).await;

    let validated = applied.validate(&platform).await.unwrap();
    assert!(validated.deployed());
    assert!(validated.warning().is_none());
    assert_eq!(validated.state().phase(), Phase::Converged);
}

#[tokio::test]
async fn stale_task_is_retryable_and_hands_the_deployment_back() {
    let platform = MemoryPlatform::new();
    platform.set_converge_on_update(false);
    let applied = deployed(&platform, "x/app:2", "x/app:3", 2).await;
    let expected = applied.outcome().deployed_task_definition.clone();

    let (pending, err) = applied.validate(&platform).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.phase(), Phase::ConvergencePending);
    match &err {
        DeployError::Convergence { found, expected: wanted, .. } => {
            assert_ne!(found, wanted);
            assert_eq!(wanted, &expected);
        }
        other => panic!("expected Convergence, got {other:?}"),
    }

    // The rollout finishes; the same deployment validates on retry.
    platform.set_running_tasks(CLUSTER, "web", &[expected.clone(), expected]);
    let validated = pending.validate(&platform).await.unwrap();
    assert!(validated.deployed());
}

#[tokio::test]
async fn partially_rolled_service_is_not_converged() {
    let platform = MemoryPlatform::new();
    platform.set_converge_on_update(false);
    let applied = deployed(&platform, "x/app:2", "x/app:3", 2).await;
    let outcome = applied.outcome().clone();
    platform.set_running_tasks(
        CLUSTER,
        "web",
        &[
            outcome.deployed_task_definition.clone(),
            outcome.previous_task_definition.clone(),
        ],
    );

    let (_, err) = applied.validate(&platform).await.unwrap_err();
    assert!(matches!(err, DeployError::Convergence { ref found, .. } if *found == outcome.previous_task_definition));
}

#[tokio::test]
async fn service_without_running_tasks_passes_with_a_warning() {
    let platform = MemoryPlatform::new();
    let applied = deployed(&platform, "x/app:2", "x/app:3", 0).await;

    let validated = applied.validate(&platform).await.unwrap();
    assert!(!validated.deployed());
    assert_eq!(validated.warning(), Some("No running task found for service: web"));
    assert_eq!(validated.state().phase(), Phase::Converged);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn scaled_to_zero_is_logged_as_a_warning() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let platform = MemoryPlatform::new();
    let applied = deployed(&platform, "x/app:2", "x/app:3", 0).await;
    applied.validate(&platform).await.unwrap();

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("assuming the service is scaled to zero"), "{output}");
}

#[tokio::test]
async fn nothing_deployed_skips_the_platform() {
    let platform = MemoryPlatform::new();
    let applied = deployed(&platform, "x/app:3", "x/app:3", 2).await;

    // An empty platform would fail any task query.
    let validated = applied.validate(&MemoryPlatform::new()).await.unwrap();
    assert!(!validated.deployed());
    assert!(validated.warning().is_none());
    assert_eq!(validated.state().phase(), Phase::SkippedValidation);
}

#[tokio::test]
async fn every_page_of_tasks_is_checked() {
    let platform = MemoryPlatform::new();
    platform.set_converge_on_update(false);
    let applied = deployed(&platform, "x/app:2", "x/app:3", 1).await;
    let outcome = applied.outcome().clone();

    let mut revisions = vec![outcome.deployed_task_definition.clone(); 250];
    platform.set_running_tasks(CLUSTER, "web", &revisions);
    assert!(applied.clone().validate(&platform).await.is_ok());

    // A single stale task on the last page is still found.
    revisions[249] = outcome.previous_task_definition.clone();
    platform.set_running_tasks(CLUSTER, "web", &revisions);
    let (_, err) = applied.validate(&platform).await.unwrap_err();
    assert!(matches!(err, DeployError::Convergence { ref found, .. } if *found == outcome.previous_task_definition));
}
