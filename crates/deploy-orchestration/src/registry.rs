//! Registry of service deployers keyed by extension prefix and service type

use crate::{Error, Result, ServiceDeployer, ServiceTypeRef};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Lookup table from [`ServiceTypeRef`] to deployer
///
/// Built once at startup and handed to the orchestrator.
#[derive(Default, Clone)]
pub struct DeployerRegistry {
    deployers: BTreeMap<String, BTreeMap<String, Arc<dyn ServiceDeployer>>>,
}

impl DeployerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deployer, replacing any previous one for the same type
    pub fn register(
        &mut self,
        prefix: impl Into<String>,
        service_type: impl Into<String>,
        deployer: Arc<dyn ServiceDeployer>,
    ) {
        let prefix = prefix.into();
        let service_type = service_type.into();
        debug!("Registering deployer {}::{}", prefix, service_type);
        self.deployers
            .entry(prefix)
            .or_default()
            .insert(service_type, deployer);
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(
        mut self,
        prefix: impl Into<String>,
        service_type: impl Into<String>,
        deployer: Arc<dyn ServiceDeployer>,
    ) -> Self {
        self.register(prefix, service_type, deployer);
        self
    }

    /// Find the deployer for a service type
    pub fn resolve(&self, service_type: &ServiceTypeRef) -> Result<Arc<dyn ServiceDeployer>> {
        let types = self
            .deployers
            .get(&service_type.prefix)
            .ok_or_else(|| Error::UnknownPrefix(service_type.prefix.clone()))?;

        types
            .get(&service_type.name)
            .cloned()
            .ok_or_else(|| Error::DeployerNotFound(service_type.clone()))
    }

    /// Whether a deployer is registered for the type
    pub fn has(&self, service_type: &ServiceTypeRef) -> bool {
        self.resolve(service_type).is_ok()
    }

    /// Registered prefixes
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.deployers.keys().map(String::as_str)
    }

    /// Service types registered under `prefix`
    pub fn service_types(&self, prefix: &str) -> Vec<&str> {
        self.deployers
            .get(prefix)
            .map(|types| types.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for DeployerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: BTreeMap<&str, Vec<&str>> = self
            .deployers
            .iter()
            .map(|(prefix, types)| (prefix.as_str(), types.keys().map(String::as_str).collect()))
            .collect();
        f.debug_struct("DeployerRegistry")
            .field("deployers", &types)
            .finish()
    }
}
