// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup and a seeded in-memory platform for integration tests.

#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use serde_json::json;
use taskroll::deploy::{ScheduledTaskTarget, ServiceTarget, WorkItem};
use taskroll::platform::{
    ContainerDefinition, EcsParameters, MemoryPlatform, RegisterTaskDefinition, RuleTarget,
    SessionSpec, TaskDefinition,
};
use taskroll::types::{ClusterName, ContainerHint, ImageRef, RoleArn, RuleName, ServiceName};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("taskroll=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const ROLE: &str = "arn:aws:iam::123456789012:role/ecs-deploy";
pub const CLUSTER: &str = "prod";

pub fn role() -> RoleArn {
    RoleArn::new(ROLE)
}

pub fn session() -> SessionSpec {
    SessionSpec {
        name: "taskroll-tests".to_string(),
        duration: Duration::from_secs(900),
    }
}

pub fn image(raw: &str) -> ImageRef {
    ImageRef::parse(raw).unwrap()
}

/// A container with the attributes real task definitions carry around.
pub fn container(name: &str, image: &str) -> ContainerDefinition {
    let mut container = ContainerDefinition::new(name, image);
    container.attributes.insert("essential".to_string(), json!(true));
    container.attributes.insert(
        "portMappings".to_string(),
        json!([{ "containerPort": 8080, "protocol": "tcp" }]),
    );
    container.attributes.insert(
        "environment".to_string(),
        json!([{ "name": "RUST_LOG", "value": "info" }]),
    );
    container
}

pub fn registration(family: &str, containers: Vec<ContainerDefinition>) -> RegisterTaskDefinition {
    RegisterTaskDefinition {
        family: family.to_string(),
        task_role_arn: Some(RoleArn::new("arn:aws:iam::123456789012:role/app")),
        execution_role_arn: None,
        network_mode: None,
        container_definitions: containers,
        volumes: vec![],
        placement_constraints: vec![],
        requires_compatibilities: vec![],
        cpu: Some("256".to_string()),
        memory: Some("512".to_string()),
    }
}

pub fn service_target(hint: &str, service: &str) -> ServiceTarget {
    ServiceTarget::new(
        ContainerHint::new(hint).unwrap(),
        ClusterName::new(CLUSTER).unwrap(),
        ServiceName::new(service).unwrap(),
    )
}

pub fn task_target(hint: &str, rule: &str) -> ScheduledTaskTarget {
    ScheduledTaskTarget::new(ContainerHint::new(hint).unwrap(), RuleName::new(rule).unwrap())
}

pub fn work_item<T>(target: T, raw_image: &str) -> WorkItem<T> {
    WorkItem {
        target,
        image: image(raw_image),
        assume_role: role(),
    }
}

/// Seed a service running `running` tasks of a new `family` revision.
pub fn seed_service(
    platform: &MemoryPlatform,
    service: &str,
    containers: Vec<ContainerDefinition>,
    running: u32,
) -> TaskDefinition {
    let definition = platform.seed_task_definition(registration(service, containers));
    platform.seed_service(CLUSTER, service, &definition.task_definition_arn, running);
    definition
}

/// Seed a rule whose single target launches a new `family` revision.
pub fn seed_rule(
    platform: &MemoryPlatform,
    rule: &str,
    family: &str,
    containers: Vec<ContainerDefinition>,
) -> TaskDefinition {
    let definition = platform.seed_task_definition(registration(family, containers));
    let mut extra = serde_json::Map::new();
    extra.insert("TaskCount".to_string(), json!(1));
    extra.insert("LaunchType".to_string(), json!("FARGATE"));
    let mut target_extra = serde_json::Map::new();
    target_extra.insert("Input".to_string(), json!("{\"mode\":\"nightly\"}"));
    platform.seed_rule(
        rule,
        RuleTarget {
            id: format!("{rule}-target"),
            arn: format!("arn:aws:ecs:eu-west-1:123456789012:cluster/{CLUSTER}"),
            role_arn: Some(RoleArn::new("arn:aws:iam::123456789012:role/events")),
            ecs_parameters: Some(EcsParameters {
                task_definition_arn: definition.task_definition_arn.clone(),
                extra,
            }),
            extra: target_extra,
        },
    );
    definition
}
