//! Orchestration context for runtime-agnostic deployment
//!
//! This module provides a context object that carries runtime dependencies
//! like the async spawner and the deployer registry throughout the
//! orchestration system.

use async_runtime_compat::Spawner;
use std::sync::Arc;

use crate::DeployerRegistry;

/// Context object for deploy orchestration
///
/// Phase operations are handed to the spawner so that every service in a
/// level runs concurrently regardless of which async runtime drives the
/// caller.
#[derive(Clone)]
pub struct OrchestrationContext {
    /// Runtime spawner for parallel execution
    pub spawner: Arc<dyn Spawner>,

    /// Deployers for every service type that may be declared
    pub registry: Arc<DeployerRegistry>,
}

impl OrchestrationContext {
    /// Create a new orchestration context
    ///
    /// The spawner is selected based on compile-time features:
    /// - `smol` feature uses SmolSpawner
    /// - `tokio` feature uses TokioSpawner
    pub fn new(registry: DeployerRegistry) -> Self {
        let spawner: Arc<dyn Spawner> = {
            #[cfg(feature = "smol")]
            {
                Arc::new(async_runtime_compat::smol::SmolSpawner)
            }

            #[cfg(all(feature = "tokio", not(feature = "smol")))]
            {
                Arc::new(async_runtime_compat::tokio::TokioSpawner)
            }

            #[cfg(not(any(feature = "smol", feature = "tokio")))]
            {
                compile_error!("One of the runtime features must be enabled: smol or tokio");
            }
        };

        Self::with_spawner(registry, spawner)
    }

    /// Create a context with a specific spawner
    ///
    /// This is useful for testing or when you need explicit control over the runtime.
    pub fn with_spawner(registry: DeployerRegistry, spawner: Arc<dyn Spawner>) -> Self {
        Self {
            spawner,
            registry: Arc::new(registry),
        }
    }

    /// Get a reference to the deployer registry
    pub fn registry(&self) -> &DeployerRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for OrchestrationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationContext")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
