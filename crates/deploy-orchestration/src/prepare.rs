//! Preflight for one environment
//!
//! Everything that can be decided without calling a deployer happens here:
//! building the graph, rejecting unknown dependencies and cycles, planning
//! levels and resolving a deployer for every service. A failure at this
//! stage means no phase runs for the environment.

use crate::{
    AccountConfig, DependencyGraph, DeployerRegistry, EnvironmentSpec, Error, LevelPlan, Result,
    ServiceContext, ServiceDeployer, plan_levels, topological_order,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Build and validate the graph of an environment and plan its levels
pub fn plan_environment(spec: &EnvironmentSpec) -> Result<(DependencyGraph, LevelPlan)> {
    let graph = DependencyGraph::from_environment(spec);
    let environment = spec.environment_name.clone();

    let unknown = graph.unknown_dependencies();
    if !unknown.is_empty() {
        let missing = unknown
            .into_iter()
            .map(|(service, dependency)| {
                format!(
                    "You declared a dependency '{}' in the service '{}' that doesn't exist",
                    dependency, service
                )
            })
            .collect();
        return Err(Error::UnknownDependency {
            environment,
            missing,
        });
    }

    if let Err(cycle) = topological_order(&graph) {
        return Err(Error::CircularDependency {
            environment,
            node: cycle.node,
        });
    }

    let plan = plan_levels(&graph)?;
    debug!(
        environment = %spec.environment_name,
        levels = plan.len(),
        "Planned deploy order"
    );

    Ok((graph, plan))
}

/// A service with its resolved deployer
#[derive(Clone)]
pub(crate) struct PreparedService {
    pub(crate) context: Arc<ServiceContext>,
    pub(crate) deployer: Arc<dyn ServiceDeployer>,
}

/// An environment that passed preflight and is ready for the phases
pub struct PreparedEnvironment {
    spec: EnvironmentSpec,
    graph: DependencyGraph,
    plan: LevelPlan,
    services: BTreeMap<String, PreparedService>,
}

impl PreparedEnvironment {
    /// Run preflight for `spec`
    pub fn prepare(
        spec: &EnvironmentSpec,
        account: Arc<AccountConfig>,
        registry: &DeployerRegistry,
    ) -> Result<Self> {
        let (graph, plan) = plan_environment(spec)?;

        let services = spec
            .services
            .iter()
            .map(|(name, service)| {
                let deployer = registry.resolve(&service.service_type)?;
                let context = Arc::new(ServiceContext::new(spec, service, account.clone()));
                Ok((name.clone(), PreparedService { context, deployer }))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            spec: spec.clone(),
            graph,
            plan,
            services,
        })
    }

    /// Environment name
    pub fn name(&self) -> &str {
        &self.spec.environment_name
    }

    /// The declaration this environment was prepared from
    pub fn spec(&self) -> &EnvironmentSpec {
        &self.spec
    }

    /// Dependency graph
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Level plan
    pub fn plan(&self) -> &LevelPlan {
        &self.plan
    }

    /// Service context of `name`
    pub fn context(&self, name: &str) -> Option<&Arc<ServiceContext>> {
        self.services.get(name).map(|service| &service.context)
    }

    pub(crate) fn service(&self, name: &str) -> Result<&PreparedService> {
        self.services.get(name).ok_or_else(|| {
            Error::InvalidConfiguration(format!(
                "service '{}' is not declared in environment '{}'",
                name,
                self.name()
            ))
        })
    }

    pub(crate) fn services(&self) -> impl Iterator<Item = (&str, &PreparedService)> {
        self.services
            .iter()
            .map(|(name, service)| (name.as_str(), service))
    }
}

impl std::fmt::Debug for PreparedEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedEnvironment")
            .field("environment", &self.spec.environment_name)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}
