// ABOUTME: Tests for the initializer stage.
// ABOUTME: Verifies fan-out, role stamping, image defaults, and release validation.

mod support;

use serde_json::json;
use support::{ROLE, role};
use taskroll::deploy::{DeployError, Release, ReleasePlan, initialize};

fn release(value: serde_json::Value) -> Release {
    serde_json::from_value(value).unwrap()
}

#[test]
fn stamps_role_and_release_image_on_every_target() {
    let release = release(json!({
        "image": "registry.example.com/app:42",
        "services": [
            { "service": "app", "clusterName": "prod", "serviceName": "web" },
            { "service": "app", "clusterName": "prod", "serviceName": "worker" }
        ],
        "tasks": [
            { "service": "app", "cwRuleName": "nightly-report" }
        ]
    }));

    let plan = initialize(release, &role()).unwrap();

    assert_eq!(plan.target_count(), 3);
    for item in plan.services.iter() {
        assert_eq!(item.assume_role.as_str(), ROLE);
        assert_eq!(item.image.as_str(), "registry.example.com/app:42");
    }
    assert_eq!(plan.tasks[0].assume_role.as_str(), ROLE);
    assert_eq!(plan.tasks[0].target.rule_name.as_str(), "nightly-report");
}

#[test]
fn target_image_overrides_release_image() {
    let release = release(json!({
        "image": "x/app:3",
        "services": [
            { "service": "app", "clusterName": "prod", "serviceName": "web" },
            { "service": "proxy", "clusterName": "prod", "serviceName": "edge", "image": "x/proxy:9" }
        ]
    }));

    let plan = initialize(release, &role()).unwrap();

    assert_eq!(plan.services.head.image.as_str(), "x/app:3");
    assert_eq!(plan.services.tail[0].image.as_str(), "x/proxy:9");
    assert!(plan.tasks.is_empty());
}

#[test]
fn null_tasks_reads_as_none() {
    let release = release(json!({
        "image": "x/app:3",
        "services": [{ "service": "app", "clusterName": "prod", "serviceName": "web" }],
        "tasks": null
    }));

    let plan = initialize(release, &role()).unwrap();
    assert!(plan.tasks.is_empty());
}

#[test]
fn release_without_services_is_rejected() {
    let release = release(json!({
        "image": "x/app:3",
        "services": [],
        "tasks": [{ "service": "app", "cwRuleName": "nightly" }]
    }));

    let err = initialize(release, &role()).unwrap_err();
    assert!(matches!(err, DeployError::NoServiceTargets));
    assert_eq!(err.to_string(), "no services found for deployment");
}

#[test]
fn target_without_any_image_is_rejected() {
    let release = release(json!({
        "services": [{ "service": "app", "clusterName": "prod", "serviceName": "web" }]
    }));

    let err = initialize(release, &role()).unwrap_err();
    assert!(matches!(err, DeployError::MissingImage(ref target) if target == "service prod/web"));
}

#[test]
fn plan_serializes_as_flat_work_items() {
    let release = release(json!({
        "release": "2024-06-01.1",
        "image": "x/app:3",
        "services": [{ "service": "app", "clusterName": "prod", "serviceName": "web" }],
        "tasks": [{ "service": "app", "cwRuleName": "nightly" }]
    }));

    let plan = initialize(release, &role()).unwrap();
    let value = serde_json::to_value(&plan).unwrap();

    assert_eq!(
        value,
        json!({
            "release": "2024-06-01.1",
            "services": [{
                "service": "app",
                "clusterName": "prod",
                "serviceName": "web",
                "image": "x/app:3",
                "assumeRole": ROLE
            }],
            "tasks": [{
                "service": "app",
                "cwRuleName": "nightly",
                "image": "x/app:3",
                "assumeRole": ROLE
            }]
        })
    );

    let reparsed: ReleasePlan = serde_json::from_value(value).unwrap();
    assert_eq!(reparsed, plan);
}

#[test]
fn plan_with_empty_services_does_not_parse() {
    let result: Result<ReleasePlan, _> = serde_json::from_value(json!({ "services": [] }));
    assert!(result.is_err());
}
