//! Bind and un-bind for one level
//!
//! A service in the level binds to every service that declared a dependency
//! on it, using that dependent's pre-deploy context.

use super::{PhaseExecutor, PhaseFuture, join_all, lookup, phase_error};
use crate::state::relationship_key;
use crate::{BindContext, Phase, PreDeployContext, Result, UnBindContext};
use futures::FutureExt;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

impl PhaseExecutor {
    pub(crate) async fn bind_level(
        &self,
        level: &BTreeSet<String>,
        pre_deploy: &BTreeMap<String, Arc<PreDeployContext>>,
    ) -> Result<BTreeMap<String, Arc<BindContext>>> {
        let mut operations: Vec<(String, PhaseFuture<Arc<BindContext>>)> = Vec::new();

        for name in level {
            let service = self.env.service(name)?;
            let own_pre_deploy = lookup(pre_deploy, Phase::PreDeploy, name)?;

            for dependent_name in self.env.graph().dependents_of(name) {
                let dependent = self.env.service(dependent_name)?.context.clone();
                let dependent_pre_deploy = lookup(pre_deploy, Phase::PreDeploy, dependent_name)?;
                let key = relationship_key(dependent_name, name);
                let own = service.context.clone();

                let operation = if service.deployer.supports(Phase::Bind) {
                    debug!("Binding service {}", key);
                    let deployer = service.deployer.clone();
                    let own_pre_deploy = own_pre_deploy.clone();
                    let on_error = phase_error(Phase::Bind, key.clone());
                    async move {
                        deployer
                            .bind(&own, &own_pre_deploy, &dependent, &dependent_pre_deploy)
                            .await
                            .map(Arc::new)
                            .map_err(on_error)
                    }
                    .boxed()
                } else {
                    futures::future::ready(Ok(Arc::new(BindContext::not_required(
                        &own, &dependent,
                    ))))
                    .boxed()
                };
                operations.push((key, operation));
            }
        }

        join_all(self.spawner.as_ref(), Phase::Bind, operations).await
    }

    pub(crate) async fn un_bind_level(
        &self,
        level: &BTreeSet<String>,
        pre_deploy: &BTreeMap<String, Arc<PreDeployContext>>,
    ) -> Result<BTreeMap<String, Arc<UnBindContext>>> {
        let mut operations: Vec<(String, PhaseFuture<Arc<UnBindContext>>)> = Vec::new();

        for name in level {
            let service = self.env.service(name)?;
            let own_pre_deploy = lookup(pre_deploy, Phase::PreDeploy, name)?;

            for dependent_name in self.env.graph().dependents_of(name) {
                let dependent = self.env.service(dependent_name)?.context.clone();
                let dependent_pre_deploy = lookup(pre_deploy, Phase::PreDeploy, dependent_name)?;
                let key = relationship_key(dependent_name, name);
                let own = service.context.clone();

                let operation = if service.deployer.supports(Phase::UnBind) {
                    debug!("UnBinding service {}", key);
                    let deployer = service.deployer.clone();
                    let own_pre_deploy = own_pre_deploy.clone();
                    let on_error = phase_error(Phase::UnBind, key.clone());
                    async move {
                        deployer
                            .un_bind(&own, &own_pre_deploy, &dependent, &dependent_pre_deploy)
                            .await
                            .map(Arc::new)
                            .map_err(on_error)
                    }
                    .boxed()
                } else {
                    futures::future::ready(Ok(Arc::new(UnBindContext::not_required(&own)))).boxed()
                };
                operations.push((key, operation));
            }
        }

        join_all(self.spawner.as_ref(), Phase::UnBind, operations).await
    }
}
