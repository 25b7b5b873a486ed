//! Pre-deploy, pre-deploy lookup and un-pre-deploy
//!
//! These phases ignore levels and run every service at once.

use super::{PhaseExecutor, PhaseFuture, join_all, phase_error};
use crate::{Error, Phase, PreDeployContext, Result, UnPreDeployContext};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

impl PhaseExecutor {
    pub(crate) async fn pre_deploy(&self) -> Result<BTreeMap<String, Arc<PreDeployContext>>> {
        info!("Executing PreDeploy phase in environment '{}'", self.env.name());

        let mut operations: Vec<(String, PhaseFuture<Arc<PreDeployContext>>)> = Vec::new();
        for (name, service) in self.env.services() {
            let own = service.context.clone();
            let operation = if service.deployer.supports(Phase::PreDeploy) {
                debug!("PreDeploying service {}", name);
                let deployer = service.deployer.clone();
                let on_error = phase_error(Phase::PreDeploy, name.to_string());
                async move {
                    deployer
                        .pre_deploy(&own)
                        .await
                        .map(Arc::new)
                        .map_err(on_error)
                }
                .boxed()
            } else {
                futures::future::ready(Ok(Arc::new(PreDeployContext::not_required(&own)))).boxed()
            };
            operations.push((name.to_string(), operation));
        }

        join_all(self.spawner.as_ref(), Phase::PreDeploy, operations).await
    }

    /// Look up the pre-deploy contexts of an environment being torn down
    pub(crate) async fn get_pre_deploy_contexts(
        &self,
    ) -> Result<BTreeMap<String, Arc<PreDeployContext>>> {
        info!(
            "Getting PreDeploy contexts in environment '{}'",
            self.env.name()
        );

        let mut operations: Vec<(String, PhaseFuture<Arc<PreDeployContext>>)> = Vec::new();
        for (name, service) in self.env.services() {
            let own = service.context.clone();
            let deployer = service.deployer.clone();

            let operation = match (
                deployer.supports(Phase::PreDeploy),
                deployer.supports(Phase::GetPreDeployContext),
            ) {
                (false, _) => {
                    futures::future::ready(Ok(Arc::new(PreDeployContext::not_required(&own))))
                        .boxed()
                }
                (true, true) => {
                    let on_error = phase_error(Phase::GetPreDeployContext, name.to_string());
                    async move {
                        deployer
                            .get_pre_deploy_context(&own)
                            .await
                            .map(Arc::new)
                            .map_err(on_error)
                    }
                    .boxed()
                }
                (true, false) => {
                    return Err(Error::Phase {
                        phase: Phase::GetPreDeployContext,
                        service: name.to_string(),
                        source: anyhow::anyhow!(
                            "service type '{}' implements PreDeploy but cannot look up its pre-deploy context",
                            own.service_type
                        ),
                    });
                }
            };
            operations.push((name.to_string(), operation));
        }

        join_all(
            self.spawner.as_ref(),
            Phase::GetPreDeployContext,
            operations,
        )
        .await
    }

    pub(crate) async fn un_pre_deploy(
        &self,
    ) -> Result<BTreeMap<String, Arc<UnPreDeployContext>>> {
        info!(
            "Executing UnPreDeploy phase in environment '{}'",
            self.env.name()
        );

        let mut operations: Vec<(String, PhaseFuture<Arc<UnPreDeployContext>>)> = Vec::new();
        for (name, service) in self.env.services() {
            let own = service.context.clone();
            let operation = if service.deployer.supports(Phase::UnPreDeploy) {
                debug!("UnPreDeploying service {}", name);
                let deployer = service.deployer.clone();
                let on_error = phase_error(Phase::UnPreDeploy, name.to_string());
                async move {
                    deployer
                        .un_pre_deploy(&own)
                        .await
                        .map(Arc::new)
                        .map_err(on_error)
                }
                .boxed()
            } else {
                futures::future::ready(Ok(Arc::new(UnPreDeployContext::not_required(&own))))
                    .boxed()
            };
            operations.push((name.to_string(), operation));
        }

        join_all(self.spawner.as_ref(), Phase::UnPreDeploy, operations).await
    }
}
