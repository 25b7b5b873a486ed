//! Common test utilities for orchestration integration tests
//!
//! [`RecordingDeployer`] writes a start and an end event into a shared
//! [`Journal`] for every operation it runs, so tests can assert on ordering.

#![allow(dead_code)]

use anyhow::bail;
use async_runtime_compat::runtime_utils::sleep;
use async_trait::async_trait;
use deploy_orchestration::{
    AccountConfig, BindContext, ConsumeEventsContext, DeployContext, DeployerInfo,
    DeployerRegistry, EnvironmentOrchestrator, EnvironmentSpec, EventConsumer,
    OrchestrationContext, Phase, PreDeployContext, ProduceEventsContext, ServiceContext,
    ServiceDeployer, ServiceSpec, ServiceTypeRef, UnBindContext, UnDeployContext,
    UnPreDeployContext,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One journal entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An operation started
    Start(Phase, String),
    /// An operation finished, successfully or not
    End(Phase, String),
}

#[derive(Default)]
struct JournalInner {
    events: Vec<Event>,
    deploy_inputs: BTreeMap<String, Vec<String>>,
}

/// Shared, ordered record of deployer calls
#[derive(Clone, Default)]
pub struct Journal {
    inner: Arc<Mutex<JournalInner>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: Event) {
        self.inner.lock().unwrap().events.push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Keys of every operation started in `phase`, in start order
    pub fn calls(&self, phase: Phase) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Start(p, key) if p == phase => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Sorted keys of every operation started in `phase`
    pub fn call_set(&self, phase: Phase) -> BTreeSet<String> {
        self.calls(phase).into_iter().collect()
    }

    /// Whether any operation other than check was started
    pub fn has_side_effects(&self) -> bool {
        self.events()
            .iter()
            .any(|event| !matches!(event, Event::Start(Phase::Check, _) | Event::End(Phase::Check, _)))
    }

    pub fn index_of(&self, event: &Event) -> usize {
        self.events()
            .iter()
            .position(|e| e == event)
            .unwrap_or_else(|| panic!("{event:?} was not recorded"))
    }

    /// Index of the last end event in `phase` for any of `keys`
    pub fn last_end(&self, phase: Phase, keys: &[&str]) -> usize {
        keys.iter()
            .map(|key| self.index_of(&Event::End(phase, key.to_string())))
            .max()
            .expect("no keys given")
    }

    /// Index of the first start event in `phase` for any of `keys`
    pub fn first_start(&self, phase: Phase, keys: &[&str]) -> usize {
        keys.iter()
            .map(|key| self.index_of(&Event::Start(phase, key.to_string())))
            .min()
            .expect("no keys given")
    }

    /// Names of the dependency deploy contexts `service` received
    pub fn deploy_inputs(&self, service: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .deploy_inputs
            .get(service)
            .cloned()
            .unwrap_or_default()
    }
}

/// Fake deployer that records every call
pub struct RecordingDeployer {
    journal: Journal,
    info: DeployerInfo,
    supported: BTreeSet<Phase>,
    delays: BTreeMap<String, Duration>,
    check_errors: BTreeMap<String, Vec<String>>,
    fail_on: BTreeSet<(Phase, String)>,
}

impl RecordingDeployer {
    /// A deployer implementing every phase
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            info: DeployerInfo {
                produced_events_supported_services: vec!["fake".to_string()],
                produced_deploy_output_types: vec!["policies".to_string()],
                consumed_deploy_output_types: vec![
                    "policies".to_string(),
                    "environmentVariables".to_string(),
                ],
                supports_tagging: true,
            },
            supported: [
                Phase::Check,
                Phase::PreDeploy,
                Phase::GetPreDeployContext,
                Phase::Bind,
                Phase::Deploy,
                Phase::ConsumeEvents,
                Phase::ProduceEvents,
                Phase::UnBind,
                Phase::UnDeploy,
                Phase::UnPreDeploy,
            ]
            .into_iter()
            .collect(),
            delays: BTreeMap::new(),
            check_errors: BTreeMap::new(),
            fail_on: BTreeSet::new(),
        }
    }

    pub fn with_info(mut self, info: DeployerInfo) -> Self {
        self.info = info;
        self
    }

    /// Stop advertising an optional phase
    pub fn without(mut self, phase: Phase) -> Self {
        self.supported.remove(&phase);
        self
    }

    /// Make every operation of `service` take `delay`
    pub fn with_delay(mut self, service: &str, delay: Duration) -> Self {
        self.delays.insert(service.to_string(), delay);
        self
    }

    pub fn with_check_error(mut self, service: &str, error: &str) -> Self {
        self.check_errors
            .entry(service.to_string())
            .or_default()
            .push(error.to_string());
        self
    }

    /// Fail the operation of `phase` recorded under `key`
    pub fn failing(mut self, phase: Phase, key: &str) -> Self {
        self.fail_on.insert((phase, key.to_string()));
        self
    }

    async fn operation(&self, phase: Phase, own: &ServiceContext, key: String) -> anyhow::Result<()> {
        self.journal.record(Event::Start(phase, key.clone()));
        if let Some(delay) = self.delays.get(&own.service_name) {
            sleep(*delay).await;
        }
        self.journal.record(Event::End(phase, key.clone()));

        if self.fail_on.contains(&(phase, key.clone())) {
            bail!("{} exploded for {}", phase, key);
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceDeployer for RecordingDeployer {
    fn info(&self) -> DeployerInfo {
        self.info.clone()
    }

    fn supports(&self, phase: Phase) -> bool {
        self.supported.contains(&phase)
    }

    fn check(&self, own: &ServiceContext, _dependencies: &[&ServiceContext]) -> Vec<String> {
        self.journal
            .record(Event::Start(Phase::Check, own.service_name.clone()));
        self.journal
            .record(Event::End(Phase::Check, own.service_name.clone()));
        self.check_errors
            .get(&own.service_name)
            .cloned()
            .unwrap_or_default()
    }

    async fn pre_deploy(&self, own: &ServiceContext) -> anyhow::Result<PreDeployContext> {
        self.operation(Phase::PreDeploy, own, own.service_name.clone())
            .await?;
        let mut context = PreDeployContext::new(own);
        context
            .security_groups
            .push(format!("sg-{}", own.service_name));
        Ok(context)
    }

    async fn get_pre_deploy_context(
        &self,
        own: &ServiceContext,
    ) -> anyhow::Result<PreDeployContext> {
        self.operation(Phase::GetPreDeployContext, own, own.service_name.clone())
            .await?;
        Ok(PreDeployContext::new(own))
    }

    async fn bind(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        dependent: &ServiceContext,
        dependent_pre_deploy: &PreDeployContext,
    ) -> anyhow::Result<BindContext> {
        assert_eq!(dependent_pre_deploy.identity.service_name, dependent.service_name);
        let key = format!("{}->{}", dependent.service_name, own.service_name);
        self.operation(Phase::Bind, own, key).await?;
        Ok(BindContext::new(own, dependent))
    }

    async fn deploy(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        dependencies: &[&DeployContext],
    ) -> anyhow::Result<DeployContext> {
        self.journal.inner.lock().unwrap().deploy_inputs.insert(
            own.service_name.clone(),
            dependencies
                .iter()
                .map(|ctx| ctx.identity.service_name.clone())
                .collect(),
        );
        self.operation(Phase::Deploy, own, own.service_name.clone())
            .await?;
        Ok(DeployContext::new(own).with_environment_variable("SERVICE", &own.service_name))
    }

    async fn consume_events(
        &self,
        own: &ServiceContext,
        _own_deploy: &DeployContext,
        producer: &ServiceContext,
        _producer_deploy: &DeployContext,
    ) -> anyhow::Result<ConsumeEventsContext> {
        let key = format!("{}->{}", own.service_name, producer.service_name);
        self.operation(Phase::ConsumeEvents, own, key).await?;
        Ok(ConsumeEventsContext::new(own, producer))
    }

    async fn produce_events(
        &self,
        own: &ServiceContext,
        _own_deploy: &DeployContext,
        consumer_config: &EventConsumer,
        consumer: &ServiceContext,
        _consumer_deploy: &DeployContext,
    ) -> anyhow::Result<ProduceEventsContext> {
        assert_eq!(consumer_config.service_name, consumer.service_name);
        let key = format!("{}->{}", own.service_name, consumer.service_name);
        self.operation(Phase::ProduceEvents, own, key).await?;
        Ok(ProduceEventsContext::new(own, consumer))
    }

    async fn un_bind(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        dependent: &ServiceContext,
        _dependent_pre_deploy: &PreDeployContext,
    ) -> anyhow::Result<UnBindContext> {
        let key = format!("{}->{}", dependent.service_name, own.service_name);
        self.operation(Phase::UnBind, own, key).await?;
        Ok(UnBindContext::new(own))
    }

    async fn un_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnDeployContext> {
        self.operation(Phase::UnDeploy, own, own.service_name.clone())
            .await?;
        Ok(UnDeployContext::new(own))
    }

    async fn un_pre_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnPreDeployContext> {
        self.operation(Phase::UnPreDeploy, own, own.service_name.clone())
            .await?;
        Ok(UnPreDeployContext::new(own))
    }
}

/// Registry with `deployer` registered as `handel::fake`
pub fn registry(deployer: RecordingDeployer) -> DeployerRegistry {
    DeployerRegistry::new().with("handel", "fake", Arc::new(deployer))
}

pub fn orchestrator(deployer: RecordingDeployer) -> EnvironmentOrchestrator {
    EnvironmentOrchestrator::new(OrchestrationContext::new(registry(deployer)))
}

pub fn account() -> AccountConfig {
    AccountConfig::new("123456789012", "us-west-2")
}

/// Environment of `handel::fake` services built from `(name, dependencies)` pairs
pub fn environment(name: &str, services: &[(&str, &[&str])]) -> EnvironmentSpec {
    services
        .iter()
        .fold(EnvironmentSpec::new("test-app", name), |env, (service, deps)| {
            let spec = deps.iter().fold(
                ServiceSpec::new(*service, ServiceTypeRef::new("handel", "fake")),
                |spec, dep| spec.with_dependency(*dep),
            );
            env.with_service(spec)
        })
}

/// Map of environments keyed by name
pub fn environments(envs: Vec<EnvironmentSpec>) -> BTreeMap<String, EnvironmentSpec> {
    envs.into_iter()
        .map(|env| (env.environment_name.clone(), env))
        .collect()
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
