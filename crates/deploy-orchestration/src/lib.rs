//! # Deploy orchestration
//!
//! Dependency-ordered, multi-phase deployment of service environments.
//!
//! An environment is a set of named services that depend on each other. This
//! crate turns an environment into a dependency graph, rejects cycles, splits
//! the graph into levels of mutually independent services and drives every
//! service through its lifecycle phases (check, pre-deploy, bind, deploy and
//! event wiring) with a [`ServiceDeployer`] resolved from a
//! [`DeployerRegistry`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use deploy_orchestration::{
//!     AccountConfig, DeployerRegistry, EnvironmentOrchestrator, EnvironmentSpec,
//!     OrchestrationContext, ServiceSpec, ServiceTypeRef,
//! };
//! use std::collections::BTreeMap;
//!
//! # async fn example(registry: DeployerRegistry) -> deploy_orchestration::Result<()> {
//! let account = AccountConfig::new("123456789012", "us-west-2");
//! let dev = EnvironmentSpec::new("my-app", "dev")
//!     .with_service(ServiceSpec::new("table", ServiceTypeRef::parse("dynamodb")?))
//!     .with_service(
//!         ServiceSpec::new("api", ServiceTypeRef::parse("lambda")?).with_dependency("table"),
//!     );
//!
//! let environments = BTreeMap::from([("dev".to_string(), dev)]);
//! let orchestrator = EnvironmentOrchestrator::new(OrchestrationContext::new(registry));
//! let results = orchestrator
//!     .deploy(&account, &environments, &["dev".to_string()])
//!     .await?;
//!
//! for result in &results {
//!     println!("{}: {}", result.environment_name, result.message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

mod config;
mod context;
mod contexts;
mod cycle;
mod deployer;
mod environment;
mod graph;
mod levels;
mod orchestrator;
mod phases;
mod prepare;
mod registry;
mod result;
mod state;

pub use config::{
    DEFAULT_PREFIX, EventConsumer, ServiceSpec, ServiceTypeRef, Tags, deserialize_tags,
};
pub use context::OrchestrationContext;
pub use contexts::{
    BindContext, ConsumeEventsContext, DeployContext, PreDeployContext, ProduceEventsContext,
    ServiceContext, ServiceIdentity, UnBindContext, UnDeployContext, UnPreDeployContext,
};
pub use cycle::{CycleFound, has_cycle, topological_order};
pub use deployer::{DeployerInfo, Phase, ServiceDeployer};
pub use environment::{AccountConfig, EnvironmentSpec};
pub use graph::{DependencyGraph, ServiceNode};
pub use levels::{LevelPlan, plan_levels};
pub use orchestrator::EnvironmentOrchestrator;
pub use phases::PhaseExecutor;
pub use prepare::{PreparedEnvironment, plan_environment};
pub use registry::DeployerRegistry;
pub use result::{
    DeployStatus, EnvironmentDeleteResult, EnvironmentDeployResult, EnvironmentResult, Lifecycle,
    all_succeeded,
};
pub use state::{DeployState, TeardownState};

/// Error types for deploy orchestration
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// One or more configuration errors reported by the check phase
    #[error("Errors while checking deploy spec:\n{}", .0.join("\n"))]
    Check(Vec<String>),

    /// The dependency graph of an environment contains a cycle
    #[error(
        "Environment '{environment}' has circular dependencies (service '{node}' is part of a cycle)"
    )]
    CircularDependency {
        /// Environment containing the cycle
        environment: String,
        /// Service found on the cycle
        node: String,
    },

    /// Services reference dependencies that are not declared in the environment
    #[error("Unknown dependencies in environment '{environment}':\n{}", .missing.join("\n"))]
    UnknownDependency {
        /// Environment with the dangling references
        environment: String,
        /// One message per missing reference
        missing: Vec<String>,
    },

    /// No deployers are registered under the prefix
    #[error("No deployers are registered for the extension prefix '{0}'")]
    UnknownPrefix(String),

    /// The prefix is known but does not provide the service type
    #[error("No deployer is registered for service type '{0}'")]
    DeployerNotFound(ServiceTypeRef),

    /// The level planner could not place every service
    #[error(
        "Unable to order services in environment '{environment}', these can never be placed: {}",
        .unplaced.join(", ")
    )]
    UnsatisfiableLeveling {
        /// Environment being planned
        environment: String,
        /// Services left over when no progress could be made
        unplaced: Vec<String>,
    },

    /// A deployer operation failed
    #[error("{phase} failed for service '{service}': {source}")]
    Phase {
        /// Phase being executed
        phase: Phase,
        /// Service (or relationship key) the operation ran for
        service: String,
        /// Error reported by the deployer
        #[source]
        source: anyhow::Error,
    },

    /// A spawned phase task ended without reporting a result
    #[error("{phase} task for '{key}' ended without reporting a result")]
    TaskAborted {
        /// Phase being executed
        phase: Phase,
        /// Service (or relationship key) of the task
        key: String,
    },

    /// A context an operation needs was not produced by an earlier phase
    #[error("Missing {phase} context for service '{service}'")]
    MissingContext {
        /// Phase that should have produced the context
        phase: Phase,
        /// Service whose context is missing
        service: String,
    },

    /// No environment names were requested
    #[error("No environments were requested")]
    NoEnvironments,

    /// A requested environment is not declared
    #[error("Environment '{0}' is not declared")]
    EnvironmentNotFound(String),

    /// Invalid account or environment configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for deploy orchestration
pub type Result<T> = std::result::Result<T, Error>;
