//! Per-service and per-phase contexts
//!
//! A [`ServiceContext`] describes one service to its deployer. Every phase
//! returns a context of its own, which the executor keeps for the rest of the
//! run and passes read-only into later phases of the same service and into the
//! bind and event phases of related services.

use crate::{AccountConfig, EnvironmentSpec, EventConsumer, ServiceSpec, ServiceTypeRef, Tags};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Everything a deployer knows about the service it is working on
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceContext {
    /// Application name
    pub app_name: String,
    /// Environment name
    pub environment_name: String,
    /// Service name
    pub service_name: String,
    /// Resolved service type
    pub service_type: ServiceTypeRef,
    /// Provider-specific parameters from the declaration
    pub params: Map<String, Value>,
    /// Account resource tags, overridden by app tags, overridden by service tags
    pub tags: Tags,
    /// Declared dependencies, in declared order without repeats
    pub dependencies: Vec<String>,
    /// Declared event consumers
    pub event_consumers: Vec<EventConsumer>,
    /// Account being deployed into
    pub account: Arc<AccountConfig>,
}

impl ServiceContext {
    /// Build the context for one service of an environment
    pub fn new(env: &EnvironmentSpec, service: &ServiceSpec, account: Arc<AccountConfig>) -> Self {
        let mut tags = account.resource_tags.clone();
        tags.extend(env.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        tags.extend(service.tags.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut seen = HashSet::new();
        let dependencies: Vec<String> = service
            .dependencies
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .cloned()
            .collect();

        Self {
            app_name: env.app_name.clone(),
            environment_name: env.environment_name.clone(),
            service_name: service.name.clone(),
            service_type: service.service_type.clone(),
            params: service.params.clone(),
            tags,
            dependencies,
            event_consumers: service.event_consumers.clone(),
            account,
        }
    }

    /// Identity of this service for phase contexts
    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity {
            app_name: self.app_name.clone(),
            environment_name: self.environment_name.clone(),
            service_name: self.service_name.clone(),
            service_type: self.service_type.clone(),
        }
    }
}

/// Names identifying a service across phases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Application name
    pub app_name: String,
    /// Environment name
    pub environment_name: String,
    /// Service name
    pub service_name: String,
    /// Service type
    pub service_type: ServiceTypeRef,
}

/// Result of pre-deploy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreDeployContext {
    /// Service that was pre-deployed
    pub identity: ServiceIdentity,
    /// Security boundaries created for the service
    pub security_groups: Vec<String>,
    /// Any other provider outputs
    pub outputs: Map<String, Value>,
}

impl PreDeployContext {
    /// Empty context for `service`
    pub fn new(service: &ServiceContext) -> Self {
        Self {
            identity: service.identity(),
            security_groups: Vec::new(),
            outputs: Map::new(),
        }
    }

    /// Context for a service whose deployer has no pre-deploy phase
    pub fn not_required(service: &ServiceContext) -> Self {
        Self::new(service)
    }
}

/// Result of binding a dependency to one of its dependents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindContext {
    /// Service that granted access
    pub dependency: ServiceIdentity,
    /// Service that was granted access
    pub dependent: ServiceIdentity,
}

impl BindContext {
    /// Context for the pair
    pub fn new(dependency: &ServiceContext, dependent: &ServiceContext) -> Self {
        Self {
            dependency: dependency.identity(),
            dependent: dependent.identity(),
        }
    }

    /// Context for a pair whose dependency has no bind phase
    pub fn not_required(dependency: &ServiceContext, dependent: &ServiceContext) -> Self {
        Self::new(dependency, dependent)
    }
}

/// Result of deploy, shared with the service's dependents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployContext {
    /// Service that was deployed
    pub identity: ServiceIdentity,
    /// Outputs other services need to route events here
    pub event_outputs: Map<String, Value>,
    /// Access policies dependents should attach
    pub policies: Vec<Value>,
    /// Environment variables dependents should inject
    pub environment_variables: BTreeMap<String, String>,
    /// Scripts dependents should run on start
    pub scripts: Vec<String>,
}

impl DeployContext {
    /// Empty context for `service`
    pub fn new(service: &ServiceContext) -> Self {
        Self {
            identity: service.identity(),
            event_outputs: Map::new(),
            policies: Vec::new(),
            environment_variables: BTreeMap::new(),
            scripts: Vec::new(),
        }
    }

    /// Add an environment variable for dependents
    pub fn with_environment_variable(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.environment_variables.insert(key.into(), value.into());
        self
    }
}

/// Result of subscribing a consumer to a producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeEventsContext {
    /// Consuming service
    pub consumer: ServiceIdentity,
    /// Producing service
    pub producer: ServiceIdentity,
}

impl ConsumeEventsContext {
    /// Context for the pair
    pub fn new(consumer: &ServiceContext, producer: &ServiceContext) -> Self {
        Self {
            consumer: consumer.identity(),
            producer: producer.identity(),
        }
    }

    /// Context for a consumer whose deployer has no consume-events phase
    pub fn not_required(consumer: &ServiceContext, producer: &ServiceContext) -> Self {
        Self::new(consumer, producer)
    }
}

/// Result of pointing a producer at a consumer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProduceEventsContext {
    /// Producing service
    pub producer: ServiceIdentity,
    /// Consuming service
    pub consumer: ServiceIdentity,
}

impl ProduceEventsContext {
    /// Context for the pair
    pub fn new(producer: &ServiceContext, consumer: &ServiceContext) -> Self {
        Self {
            producer: producer.identity(),
            consumer: consumer.identity(),
        }
    }

    /// Context for a producer whose deployer has no produce-events phase
    pub fn not_required(producer: &ServiceContext, consumer: &ServiceContext) -> Self {
        Self::new(producer, consumer)
    }
}

macro_rules! teardown_context {
    ($(#[$doc:meta] $name:ident),+ $(,)?) => {
        $(
            #[$doc]
            #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
            pub struct $name {
                /// Service that was torn down
                pub identity: ServiceIdentity,
            }

            impl $name {
                /// Context for `service`
                pub fn new(service: &ServiceContext) -> Self {
                    Self {
                        identity: service.identity(),
                    }
                }

                /// Context for a service whose deployer has no such phase
                pub fn not_required(service: &ServiceContext) -> Self {
                    Self::new(service)
                }
            }
        )+
    };
}

teardown_context!(
    /// Result of revoking a binding
    UnBindContext,
    /// Result of removing a service
    UnDeployContext,
    /// Result of removing pre-deploy resources
    UnPreDeployContext,
);
