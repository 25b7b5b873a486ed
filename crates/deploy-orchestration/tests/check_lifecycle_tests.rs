//! Integration tests for the check lifecycle and the built-in checks

mod common;

use common::{Journal, RecordingDeployer, account, environment, environments, names};
use deploy_orchestration::{
    DeployerInfo, DeployerRegistry, EnvironmentOrchestrator, Error, OrchestrationContext,
    ServiceSpec, ServiceTypeRef,
};
use std::sync::Arc;

fn orchestrator_with(registry: DeployerRegistry) -> EnvironmentOrchestrator {
    EnvironmentOrchestrator::new(OrchestrationContext::new(registry))
}

#[test]
fn test_check_reports_per_environment() {
    let journal = Journal::new();
    let registry = common::registry(RecordingDeployer::new(&journal).with_check_error("b", "bad"));
    let orchestrator = orchestrator_with(registry);
    let envs = environments(vec![
        environment("dev", &[("a", &[]), ("b", &["a"])]),
        environment("prod", &[("a", &[])]),
        environment("loop", &[("a", &["a"])]),
    ]);

    let results = orchestrator
        .check(&account(), &envs, &names(&["dev", "prod", "loop"]))
        .unwrap();

    assert_eq!(results["dev"], vec!["Service 'b' - bad".to_string()]);
    assert!(results["prod"].is_empty());
    assert_eq!(results["loop"].len(), 1);
    assert!(results["loop"][0].contains("circular dependencies"));
    assert!(!journal.has_side_effects());
}

#[test]
fn test_check_requires_environment_names() {
    let orchestrator = orchestrator_with(DeployerRegistry::new());
    let err = orchestrator
        .check(&account(), &environments(vec![]), &[])
        .unwrap_err();
    assert!(matches!(err, Error::NoEnvironments));
}

#[test]
fn test_dependency_output_types_must_be_consumable() {
    let journal = Journal::new();
    let producer = RecordingDeployer::new(&journal).with_info(DeployerInfo {
        produced_deploy_output_types: vec!["securityGroups".to_string()],
        ..DeployerInfo::default()
    });
    let silent = RecordingDeployer::new(&journal).with_info(DeployerInfo::default());

    let registry = common::registry(RecordingDeployer::new(&journal))
        .with("handel", "efs", Arc::new(producer))
        .with("handel", "cloudwatch", Arc::new(silent));
    let orchestrator = orchestrator_with(registry);

    let env = environment("dev", &[])
        .with_service(ServiceSpec::new("disk", ServiceTypeRef::new("handel", "efs")))
        .with_service(ServiceSpec::new(
            "alarms",
            ServiceTypeRef::new("handel", "cloudwatch"),
        ))
        .with_service(
            ServiceSpec::new("app", ServiceTypeRef::new("handel", "fake"))
                .with_dependency("disk")
                .with_dependency("alarms"),
        );

    let results = orchestrator
        .check(&account(), &environments(vec![env]), &names(&["dev"]))
        .unwrap();

    assert_eq!(
        results["dev"],
        vec![
            "Service 'app' - The 'efs' service type is not consumable by the 'fake' service type"
                .to_string(),
            "Service 'app' - The 'cloudwatch' service type is not consumable by the 'fake' service type"
                .to_string(),
        ]
    );
}

#[test]
fn test_repeated_dependency_is_checked_once() {
    let journal = Journal::new();
    let silent = RecordingDeployer::new(&journal).with_info(DeployerInfo::default());
    let registry = common::registry(RecordingDeployer::new(&journal))
        .with("handel", "cloudwatch", Arc::new(silent));
    let orchestrator = orchestrator_with(registry);

    let env = environment("dev", &[])
        .with_service(ServiceSpec::new(
            "alarms",
            ServiceTypeRef::new("handel", "cloudwatch"),
        ))
        .with_service(
            ServiceSpec::new("app", ServiceTypeRef::new("handel", "fake"))
                .with_dependency("alarms")
                .with_dependency("alarms"),
        );

    let results = orchestrator
        .check(&account(), &environments(vec![env]), &names(&["dev"]))
        .unwrap();

    assert_eq!(results["dev"].len(), 1, "{:?}", results["dev"]);
}

#[test]
fn test_event_consumers_must_exist_and_be_supported() {
    let journal = Journal::new();
    let registry = common::registry(RecordingDeployer::new(&journal)).with(
        "handel",
        "dynamodb",
        Arc::new(RecordingDeployer::new(&journal)),
    );
    let orchestrator = orchestrator_with(registry);

    let env = environment("dev", &[])
        .with_service(ServiceSpec::new("table", ServiceTypeRef::new("handel", "dynamodb")))
        .with_service(
            ServiceSpec::new("topic", ServiceTypeRef::new("handel", "fake"))
                .with_event_consumer("table")
                .with_event_consumer("nowhere"),
        );

    let results = orchestrator
        .check(&account(), &environments(vec![env]), &names(&["dev"]))
        .unwrap();

    assert_eq!(
        results["dev"],
        vec![
            "Service 'topic' - The 'dynamodb' service type can't consume events from the 'fake' service type"
                .to_string(),
            "Service 'topic' - You declared an event consumer 'nowhere' that doesn't exist"
                .to_string(),
        ]
    );
}

#[test]
fn test_required_tags() {
    let journal = Journal::new();
    let untagged = RecordingDeployer::new(&journal).with_info(DeployerInfo {
        supports_tagging: false,
        ..DeployerInfo::default()
    });
    let registry = common::registry(RecordingDeployer::new(&journal)).with(
        "handel",
        "route53",
        Arc::new(untagged),
    );
    let orchestrator = orchestrator_with(registry);

    let env = environment("dev", &[("plain", &[])])
        .with_tag("team", "platform")
        .with_service(
            ServiceSpec::new("tagged", ServiceTypeRef::new("handel", "fake")).with_tag("cost", "42"),
        )
        .with_service(ServiceSpec::new("zone", ServiceTypeRef::new("handel", "route53")));
    let account = account()
        .with_required_tag("team")
        .with_required_tag("cost");

    let results = orchestrator
        .check(&account, &environments(vec![env]), &names(&["dev"]))
        .unwrap();

    assert_eq!(
        results["dev"],
        vec![
            "Service 'plain' - Tagging - plain - Missing required tag 'cost'. You can apply this tag at either the application or service level."
                .to_string(),
        ]
    );
}
