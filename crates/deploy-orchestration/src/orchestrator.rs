//! Environment orchestration engine
//!
//! Entry point for the deploy, delete and check lifecycles. Every requested
//! environment runs independently: a failure in one never affects another,
//! and each one yields exactly one result.

use crate::phases::{PhaseExecutor, check::check_environment};
use crate::{
    AccountConfig, EnvironmentDeleteResult, EnvironmentDeployResult, EnvironmentResult,
    EnvironmentSpec, Error, Lifecycle, PreparedEnvironment, Result,
    context::OrchestrationContext,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Runs lifecycles over sets of environments
#[derive(Debug, Clone)]
pub struct EnvironmentOrchestrator {
    context: Arc<OrchestrationContext>,
}

impl EnvironmentOrchestrator {
    /// Create a new orchestrator
    pub fn new(context: OrchestrationContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Get the orchestration context
    pub fn context(&self) -> &OrchestrationContext {
        &self.context
    }

    /// Deploy the named environments concurrently
    ///
    /// Only fails outright when no environment is requested. Every other
    /// problem becomes a failed result for the environment concerned.
    pub async fn deploy(
        &self,
        account: &AccountConfig,
        environments: &BTreeMap<String, EnvironmentSpec>,
        names: &[String],
    ) -> Result<Vec<EnvironmentDeployResult>> {
        self.run(Lifecycle::Deploy, account, environments, names)
            .await
    }

    /// Delete the named environments concurrently
    pub async fn delete(
        &self,
        account: &AccountConfig,
        environments: &BTreeMap<String, EnvironmentSpec>,
        names: &[String],
    ) -> Result<Vec<EnvironmentDeleteResult>> {
        self.run(Lifecycle::Delete, account, environments, names)
            .await
    }

    /// Run preflight and the check phase only, returning the errors of each
    /// environment
    ///
    /// Preflight failures are reported as a single error for that
    /// environment.
    pub fn check(
        &self,
        account: &AccountConfig,
        environments: &BTreeMap<String, EnvironmentSpec>,
        names: &[String],
    ) -> Result<BTreeMap<String, Vec<String>>> {
        if names.is_empty() {
            return Err(Error::NoEnvironments);
        }

        let account = Arc::new(account.clone());
        let mut results = BTreeMap::new();
        for name in names {
            let errors = match self.prepare(&account, environments, name) {
                Ok(env) => check_environment(&env),
                Err(err) => vec![err.to_string()],
            };
            results.insert(name.clone(), errors);
        }
        Ok(results)
    }

    async fn run(
        &self,
        lifecycle: Lifecycle,
        account: &AccountConfig,
        environments: &BTreeMap<String, EnvironmentSpec>,
        names: &[String],
    ) -> Result<Vec<EnvironmentResult>> {
        if names.is_empty() {
            return Err(Error::NoEnvironments);
        }

        let account = Arc::new(account.clone());
        let runs = names
            .iter()
            .map(|name| self.run_environment(lifecycle, account.clone(), environments, name));

        Ok(futures::future::join_all(runs).await)
    }

    async fn run_environment(
        &self,
        lifecycle: Lifecycle,
        account: Arc<AccountConfig>,
        environments: &BTreeMap<String, EnvironmentSpec>,
        name: &str,
    ) -> EnvironmentResult {
        let start_time = Utc::now();
        info!("Starting {:?} of environment '{}'", lifecycle, name);

        let outcome = async {
            let env = Arc::new(self.prepare(&account, environments, name)?);
            let executor = PhaseExecutor::new(env, self.context.spawner.clone());
            match lifecycle {
                Lifecycle::Deploy => executor.deploy().await.map(|_| ()),
                Lifecycle::Delete => executor.delete().await.map(|_| ()),
            }
        }
        .await;

        match outcome {
            Ok(()) => {
                info!("Finished {:?} of environment '{}'", lifecycle, name);
                EnvironmentResult::success(lifecycle, name, start_time)
            }
            Err(err) => {
                error!("{:?} of environment '{}' failed: {}", lifecycle, name, err);
                EnvironmentResult::failure(lifecycle, name, start_time, err)
            }
        }
    }

    fn prepare(
        &self,
        account: &Arc<AccountConfig>,
        environments: &BTreeMap<String, EnvironmentSpec>,
        name: &str,
    ) -> Result<PreparedEnvironment> {
        account.validate()?;
        let spec = environments
            .get(name)
            .ok_or_else(|| Error::EnvironmentNotFound(name.to_string()))?;
        PreparedEnvironment::prepare(spec, account.clone(), self.context.registry())
    }
}
