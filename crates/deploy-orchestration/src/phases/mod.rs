//! Phase execution for one prepared environment
//!
//! Phases run strictly one after another. Inside a phase (or inside one
//! level of the bind and deploy phases) every operation is spawned at once
//! and joined with [`join_all`].
//!
//! The join reports the first failure by completion time and returns without
//! waiting for the rest. Operations that are still running are not cancelled:
//! they keep running on the runtime and their results are dropped, so their
//! side effects may land after the failure has been reported.

mod bind;
pub(crate) mod check;
mod deploy;
mod events;
mod pre_deploy;

use crate::{DeployState, Error, Phase, PreparedEnvironment, Result, TeardownState};
use async_runtime_compat::{Spawner, spawn_output};
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A phase operation ready to be spawned
pub(crate) type PhaseFuture<T> = BoxFuture<'static, Result<T>>;

/// Runs the lifecycle phases of a prepared environment
#[derive(Clone)]
pub struct PhaseExecutor {
    env: Arc<PreparedEnvironment>,
    spawner: Arc<dyn Spawner>,
}

impl PhaseExecutor {
    /// Create an executor that spawns operations on `spawner`
    pub fn new(env: Arc<PreparedEnvironment>, spawner: Arc<dyn Spawner>) -> Self {
        Self { env, spawner }
    }

    /// The environment being executed
    pub fn environment(&self) -> &PreparedEnvironment {
        &self.env
    }

    /// Deploy the environment
    ///
    /// Check, then pre-deploy every service, then bind and deploy level by
    /// level, then wire events.
    pub async fn deploy(&self) -> Result<DeployState> {
        let errors = self.check();
        if !errors.is_empty() {
            return Err(Error::Check(errors));
        }

        let mut state = DeployState {
            pre_deploy: self.pre_deploy().await?,
            ..Default::default()
        };

        for (index, level) in self.env.plan().iter().enumerate() {
            info!(
                "Deploying level {} of environment '{}': {}",
                index,
                self.env.name(),
                join_names(level)
            );
            let binds = self.bind_level(level, &state.pre_deploy).await?;
            state.bind.extend(binds);

            let deploys = self
                .deploy_level(level, &state.pre_deploy, &state.deploy)
                .await?;
            state.deploy.extend(deploys);
        }

        let (consume, produce) = self.wire_events(&state.deploy).await?;
        state.consume_events = consume;
        state.produce_events = produce;

        info!("Finished deploying environment '{}'", self.env.name());
        Ok(state)
    }

    /// Tear the environment down
    ///
    /// Looks up pre-deploy state, then un-deploys and un-binds level by level
    /// from the last level to the first, then un-pre-deploys every service.
    pub async fn delete(&self) -> Result<TeardownState> {
        let mut state = TeardownState {
            pre_deploy: self.get_pre_deploy_contexts().await?,
            ..Default::default()
        };

        for (index, level) in self.env.plan().iter().enumerate().rev() {
            info!(
                "Deleting level {} of environment '{}': {}",
                index,
                self.env.name(),
                join_names(level)
            );
            let un_deploys = self.un_deploy_level(level).await?;
            state.un_deploy.extend(un_deploys);

            let un_binds = self.un_bind_level(level, &state.pre_deploy).await?;
            state.un_bind.extend(un_binds);
        }

        state.un_pre_deploy = self.un_pre_deploy().await?;

        info!("Finished deleting environment '{}'", self.env.name());
        Ok(state)
    }
}

fn join_names<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    names
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Spawn every operation and collect the results by key
///
/// Returns the first error in completion order without waiting for the
/// remaining operations.
pub(crate) async fn join_all<T: Send + 'static>(
    spawner: &dyn Spawner,
    phase: Phase,
    operations: Vec<(String, PhaseFuture<T>)>,
) -> Result<BTreeMap<String, T>> {
    debug!("Dispatching {} {} operations", operations.len(), phase);

    let mut pending: FuturesUnordered<_> = operations
        .into_iter()
        .map(|(key, operation)| {
            let output = spawn_output(spawner, operation);
            async move { (key, output.wait().await) }
        })
        .collect();

    let mut results = BTreeMap::new();
    while let Some((key, output)) = pending.next().await {
        match output {
            Some(Ok(value)) => {
                results.insert(key, value);
            }
            Some(Err(err)) => {
                warn!(
                    "{} failed for '{}' with {} operations still running: {}",
                    phase,
                    key,
                    pending.len(),
                    err
                );
                return Err(err);
            }
            None => {
                warn!("{} task for '{}' ended without a result", phase, key);
                return Err(Error::TaskAborted { phase, key });
            }
        }
    }

    Ok(results)
}

/// Fetch a context an earlier phase produced
pub(crate) fn lookup<T>(
    contexts: &BTreeMap<String, Arc<T>>,
    phase: Phase,
    service: &str,
) -> Result<Arc<T>> {
    contexts
        .get(service)
        .cloned()
        .ok_or_else(|| Error::MissingContext {
            phase,
            service: service.to_string(),
        })
}

/// Wrap a deployer failure with the phase and service it came from
pub(crate) fn phase_error(
    phase: Phase,
    service: String,
) -> impl FnOnce(anyhow::Error) -> Error {
    move |source| Error::Phase {
        phase,
        service,
        source,
    }
}
