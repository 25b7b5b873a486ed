//! The per-service-type deployer capability
//!
//! A [`ServiceDeployer`] knows how to take one kind of service through its
//! lifecycle. Only [`check`](ServiceDeployer::check),
//! [`deploy`](ServiceDeployer::deploy) and
//! [`un_deploy`](ServiceDeployer::un_deploy) are mandatory. Every other phase
//! is optional: a deployer advertises what it implements through
//! [`supports`](ServiceDeployer::supports) and the executor treats an
//! unsupported phase as a no-op for that service.

use crate::{
    BindContext, ConsumeEventsContext, DeployContext, EventConsumer, PreDeployContext,
    ProduceEventsContext, ServiceContext, UnBindContext, UnDeployContext, UnPreDeployContext,
};
use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Validate configuration without side effects
    Check,
    /// Create resources that have no ordering requirements
    PreDeploy,
    /// Look up resources created by an earlier pre-deploy
    GetPreDeployContext,
    /// Let a dependency grant access to a dependent
    Bind,
    /// Provision the service
    Deploy,
    /// Subscribe a consumer to a producer's events
    ConsumeEvents,
    /// Point a producer's events at a consumer
    ProduceEvents,
    /// Revoke a binding
    UnBind,
    /// Remove the service
    UnDeploy,
    /// Remove pre-deploy resources
    UnPreDeploy,
}

impl Phase {
    /// Phases every deployer must implement
    pub const REQUIRED: [Phase; 3] = [Phase::Check, Phase::Deploy, Phase::UnDeploy];

    /// Whether every deployer must implement this phase
    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Check => "Check",
            Phase::PreDeploy => "PreDeploy",
            Phase::GetPreDeployContext => "GetPreDeployContext",
            Phase::Bind => "Bind",
            Phase::Deploy => "Deploy",
            Phase::ConsumeEvents => "ConsumeEvents",
            Phase::ProduceEvents => "ProduceEvents",
            Phase::UnBind => "UnBind",
            Phase::UnDeploy => "UnDeploy",
            Phase::UnPreDeploy => "UnPreDeploy",
        };
        f.write_str(name)
    }
}

/// Static facts about a deployer used by the check phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployerInfo {
    /// Service types this deployer can send events to
    pub produced_events_supported_services: Vec<String>,
    /// Output types this deployer hands to its dependents
    pub produced_deploy_output_types: Vec<String>,
    /// Output types this deployer accepts from its dependencies
    pub consumed_deploy_output_types: Vec<String>,
    /// Whether resources created by this deployer carry tags
    pub supports_tagging: bool,
}

impl Default for DeployerInfo {
    fn default() -> Self {
        Self {
            produced_events_supported_services: Vec::new(),
            produced_deploy_output_types: Vec::new(),
            consumed_deploy_output_types: Vec::new(),
            supports_tagging: true,
        }
    }
}

fn not_implemented(phase: Phase, own: &ServiceContext) -> anyhow::Error {
    anyhow!(
        "deployer for service type '{}' does not implement {}",
        own.service_type,
        phase
    )
}

/// Per-service-type lifecycle implementation
#[async_trait]
pub trait ServiceDeployer: Send + Sync {
    /// Static information about this deployer
    fn info(&self) -> DeployerInfo {
        DeployerInfo::default()
    }

    /// Whether this deployer implements `phase`
    ///
    /// Defaults to the required phases only. Implementors that override an
    /// optional phase method must also report it here.
    fn supports(&self, phase: Phase) -> bool {
        phase.is_required()
    }

    /// Validate a service's configuration, returning one message per problem
    fn check(&self, own: &ServiceContext, dependencies: &[&ServiceContext]) -> Vec<String>;

    /// Create resources that do not depend on other services
    async fn pre_deploy(&self, own: &ServiceContext) -> anyhow::Result<PreDeployContext> {
        Err(not_implemented(Phase::PreDeploy, own))
    }

    /// Look up the resources a previous pre-deploy created
    async fn get_pre_deploy_context(
        &self,
        own: &ServiceContext,
    ) -> anyhow::Result<PreDeployContext> {
        Err(not_implemented(Phase::GetPreDeployContext, own))
    }

    /// Grant `dependent` access to this service
    async fn bind(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        _dependent: &ServiceContext,
        _dependent_pre_deploy: &PreDeployContext,
    ) -> anyhow::Result<BindContext> {
        Err(not_implemented(Phase::Bind, own))
    }

    /// Provision this service
    ///
    /// `dependencies` holds the deploy contexts of the declared dependencies,
    /// in declaration order.
    async fn deploy(
        &self,
        own: &ServiceContext,
        own_pre_deploy: &PreDeployContext,
        dependencies: &[&DeployContext],
    ) -> anyhow::Result<DeployContext>;

    /// Subscribe this service to events from `producer`
    async fn consume_events(
        &self,
        own: &ServiceContext,
        _own_deploy: &DeployContext,
        _producer: &ServiceContext,
        _producer_deploy: &DeployContext,
    ) -> anyhow::Result<ConsumeEventsContext> {
        Err(not_implemented(Phase::ConsumeEvents, own))
    }

    /// Send this service's events to `consumer`
    async fn produce_events(
        &self,
        own: &ServiceContext,
        _own_deploy: &DeployContext,
        _consumer_config: &EventConsumer,
        _consumer: &ServiceContext,
        _consumer_deploy: &DeployContext,
    ) -> anyhow::Result<ProduceEventsContext> {
        Err(not_implemented(Phase::ProduceEvents, own))
    }

    /// Revoke the access granted to `dependent`
    async fn un_bind(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        _dependent: &ServiceContext,
        _dependent_pre_deploy: &PreDeployContext,
    ) -> anyhow::Result<UnBindContext> {
        Err(not_implemented(Phase::UnBind, own))
    }

    /// Remove this service
    async fn un_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnDeployContext>;

    /// Remove the pre-deploy resources of this service
    async fn un_pre_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnPreDeployContext> {
        Err(not_implemented(Phase::UnPreDeploy, own))
    }
}
