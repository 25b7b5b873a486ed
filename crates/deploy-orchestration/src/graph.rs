//! Dependency graph of the services in one environment

use crate::{EnvironmentSpec, ServiceTypeRef};
use std::collections::{BTreeMap, BTreeSet};

/// One service in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNode {
    /// Service name, unique within the environment
    pub name: String,
    /// Services that must be deployed before this one
    pub dependencies: BTreeSet<String>,
    /// Deployer lookup key
    pub service_type: ServiceTypeRef,
}

/// Dependency graph for one environment
///
/// Edges point from a service to the services it depends on. Nothing checks
/// that the targets exist; see [`DependencyGraph::unknown_dependencies`].
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    environment: String,
    nodes: BTreeMap<String, ServiceNode>,
}

impl DependencyGraph {
    /// Build the graph from an environment's service declarations
    pub fn from_environment(spec: &EnvironmentSpec) -> Self {
        let nodes = spec.services.iter().map(|(name, service)| ServiceNode {
            name: name.clone(),
            dependencies: service.dependencies.iter().cloned().collect(),
            service_type: service.service_type.clone(),
        });

        Self::from_nodes(&spec.environment_name, nodes)
    }

    /// Build a graph from nodes directly
    pub fn from_nodes(
        environment: impl Into<String>,
        nodes: impl IntoIterator<Item = ServiceNode>,
    ) -> Self {
        Self {
            environment: environment.into(),
            nodes: nodes
                .into_iter()
                .map(|node| (node.name.clone(), node))
                .collect(),
        }
    }

    /// Name of the environment this graph belongs to
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Look up a node by name
    pub fn node(&self, name: &str) -> Option<&ServiceNode> {
        self.nodes.get(name)
    }

    /// Iterate over all nodes in name order
    pub fn nodes(&self) -> impl Iterator<Item = &ServiceNode> {
        self.nodes.values()
    }

    /// All node names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether a node with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Services that declare a dependency on `name`, in name order
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|node| node.dependencies.contains(name))
            .map(|node| node.name.as_str())
            .collect()
    }

    /// `(service, dependency)` pairs whose dependency is not a node
    pub fn unknown_dependencies(&self) -> Vec<(&str, &str)> {
        self.nodes
            .values()
            .flat_map(|node| {
                node.dependencies
                    .iter()
                    .filter(|dep| !self.nodes.contains_key(dep.as_str()))
                    .map(move |dep| (node.name.as_str(), dep.as_str()))
            })
            .collect()
    }
}
