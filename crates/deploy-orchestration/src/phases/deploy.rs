//! Deploy and un-deploy for one level

use super::{PhaseExecutor, PhaseFuture, join_all, lookup, phase_error};
use crate::{DeployContext, Phase, PreDeployContext, Result, UnDeployContext};
use futures::FutureExt;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

impl PhaseExecutor {
    /// Deploy every service in `level`
    ///
    /// `deployed` must already hold the deploy context of every dependency,
    /// which holds because dependencies live in earlier levels.
    pub(crate) async fn deploy_level(
        &self,
        level: &BTreeSet<String>,
        pre_deploy: &BTreeMap<String, Arc<PreDeployContext>>,
        deployed: &BTreeMap<String, Arc<DeployContext>>,
    ) -> Result<BTreeMap<String, Arc<DeployContext>>> {
        let mut operations: Vec<(String, PhaseFuture<Arc<DeployContext>>)> = Vec::new();

        for name in level {
            let service = self.env.service(name)?;
            let own = service.context.clone();
            let own_pre_deploy = lookup(pre_deploy, Phase::PreDeploy, name)?;
            let dependencies = own
                .dependencies
                .iter()
                .map(|dependency| lookup(deployed, Phase::Deploy, dependency))
                .collect::<Result<Vec<_>>>()?;

            debug!("Deploying service {}", name);
            let deployer = service.deployer.clone();
            let on_error = phase_error(Phase::Deploy, name.to_string());
            let operation = async move {
                let dependencies: Vec<&DeployContext> =
                    dependencies.iter().map(Arc::as_ref).collect();
                deployer
                    .deploy(&own, &own_pre_deploy, &dependencies)
                    .await
                    .map(Arc::new)
                    .map_err(on_error)
            }
            .boxed();
            operations.push((name.clone(), operation));
        }

        join_all(self.spawner.as_ref(), Phase::Deploy, operations).await
    }

    pub(crate) async fn un_deploy_level(
        &self,
        level: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, Arc<UnDeployContext>>> {
        let mut operations: Vec<(String, PhaseFuture<Arc<UnDeployContext>>)> = Vec::new();

        for name in level {
            let service = self.env.service(name)?;
            let own = service.context.clone();

            debug!("UnDeploying service {}", name);
            let deployer = service.deployer.clone();
            let on_error = phase_error(Phase::UnDeploy, name.to_string());
            let operation = async move {
                deployer
                    .un_deploy(&own)
                    .await
                    .map(Arc::new)
                    .map_err(on_error)
            }
            .boxed();
            operations.push((name.clone(), operation));
        }

        join_all(self.spawner.as_ref(), Phase::UnDeploy, operations).await
    }
}
