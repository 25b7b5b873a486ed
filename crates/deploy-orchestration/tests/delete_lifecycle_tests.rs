//! Integration tests for the delete lifecycle

mod common;

use common::{Journal, RecordingDeployer, account, environment, environments, names, orchestrator};
use deploy_orchestration::{DeployStatus, Error, Lifecycle, Phase, all_succeeded};
use std::collections::BTreeSet;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[smol_potat::test]
async fn test_teardown_runs_levels_in_reverse() {
    let journal = Journal::new();
    let orchestrator = orchestrator(RecordingDeployer::new(&journal));
    let envs = environments(vec![environment(
        "dev",
        &[("a", &[]), ("b", &["a"]), ("c", &["b"])],
    )]);

    let results = orchestrator
        .delete(&account(), &envs, &names(&["dev"]))
        .await
        .unwrap();

    assert!(all_succeeded(&results));
    assert_eq!(results[0].lifecycle, Lifecycle::Delete);

    let all = ["a", "b", "c"];
    assert_eq!(journal.call_set(Phase::GetPreDeployContext), set(&all));
    assert!(
        journal.last_end(Phase::GetPreDeployContext, &all)
            < journal.first_start(Phase::UnDeploy, &all)
    );

    // c, then b, then a
    assert_eq!(
        journal.calls(Phase::UnDeploy),
        vec!["c".to_string(), "b".to_string(), "a".to_string()]
    );
    // Within a level un-deploy precedes un-bind
    assert!(journal.last_end(Phase::UnDeploy, &["b"]) < journal.first_start(Phase::UnBind, &["c->b"]));
    assert!(journal.last_end(Phase::UnBind, &["c->b"]) < journal.first_start(Phase::UnDeploy, &["a"]));
    assert!(journal.last_end(Phase::UnDeploy, &["a"]) < journal.first_start(Phase::UnBind, &["b->a"]));

    // Un-pre-deploy comes last, for every service
    assert_eq!(journal.call_set(Phase::UnPreDeploy), set(&all));
    assert!(
        journal.last_end(Phase::UnBind, &["b->a", "c->b"])
            < journal.first_start(Phase::UnPreDeploy, &all)
    );

    assert!(journal.calls(Phase::Deploy).is_empty());
    assert!(journal.calls(Phase::Check).is_empty());
}

#[smol_potat::test]
async fn test_pre_deploy_without_lookup_fails_before_teardown() {
    let journal = Journal::new();
    let deployer = RecordingDeployer::new(&journal).without(Phase::GetPreDeployContext);
    let orchestrator = orchestrator(deployer);
    let envs = environments(vec![environment("dev", &[("a", &[])])]);

    let results = orchestrator
        .delete(&account(), &envs, &names(&["dev"]))
        .await
        .unwrap();

    assert_eq!(results[0].status, DeployStatus::Failure);
    assert!(matches!(
        results[0].error.as_deref(),
        Some(Error::Phase { phase: Phase::GetPreDeployContext, .. })
    ));
    assert!(journal.events().is_empty());
}

#[smol_potat::test]
async fn test_services_without_pre_deploy_skip_lookup_and_un_pre_deploy() {
    let journal = Journal::new();
    let deployer = RecordingDeployer::new(&journal)
        .without(Phase::PreDeploy)
        .without(Phase::GetPreDeployContext)
        .without(Phase::UnPreDeploy)
        .without(Phase::UnBind);
    let orchestrator = orchestrator(deployer);
    let envs = environments(vec![environment("dev", &[("a", &[]), ("b", &["a"])])]);

    let results = orchestrator
        .delete(&account(), &envs, &names(&["dev"]))
        .await
        .unwrap();

    assert!(all_succeeded(&results));
    assert!(journal.calls(Phase::GetPreDeployContext).is_empty());
    assert!(journal.calls(Phase::UnBind).is_empty());
    assert!(journal.calls(Phase::UnPreDeploy).is_empty());
    assert_eq!(
        journal.calls(Phase::UnDeploy),
        vec!["b".to_string(), "a".to_string()]
    );
}

#[smol_potat::test]
async fn test_un_deploy_failure_keeps_earlier_levels() {
    let journal = Journal::new();
    let deployer = RecordingDeployer::new(&journal).failing(Phase::UnDeploy, "b");
    let orchestrator = orchestrator(deployer);
    let envs = environments(vec![environment("dev", &[("a", &[]), ("b", &["a"])])]);

    let results = orchestrator
        .delete(&account(), &envs, &names(&["dev"]))
        .await
        .unwrap();

    assert_eq!(results[0].status, DeployStatus::Failure);
    assert!(results[0].message.contains("UnDeploy exploded for b"));
    assert!(!journal.call_set(Phase::UnDeploy).contains("a"));
    assert!(journal.calls(Phase::UnPreDeploy).is_empty());
}

#[smol_potat::test]
async fn test_delete_rejects_cycles() {
    let journal = Journal::new();
    let orchestrator = orchestrator(RecordingDeployer::new(&journal));
    let envs = environments(vec![environment("dev", &[("a", &["a"])])]);

    let results = orchestrator
        .delete(&account(), &envs, &names(&["dev"]))
        .await
        .unwrap();

    assert!(matches!(
        results[0].error.as_deref(),
        Some(Error::CircularDependency { node, .. }) if node == "a"
    ));
    assert!(journal.events().is_empty());
}
