//! Event wiring
//!
//! Runs after every level is deployed. Consume and produce operations for the
//! whole environment are dispatched together; neither family waits for the
//! other.

use super::{PhaseExecutor, PhaseFuture, join_all, lookup, phase_error};
use crate::state::relationship_key;
use crate::{ConsumeEventsContext, DeployContext, Phase, ProduceEventsContext, Result};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

type ConsumeContexts = BTreeMap<String, Arc<ConsumeEventsContext>>;
type ProduceContexts = BTreeMap<String, Arc<ProduceEventsContext>>;

impl PhaseExecutor {
    pub(crate) async fn wire_events(
        &self,
        deployed: &BTreeMap<String, Arc<DeployContext>>,
    ) -> Result<(ConsumeContexts, ProduceContexts)> {
        info!(
            "Executing event wiring phase in environment '{}'",
            self.env.name()
        );

        let mut consume: Vec<(String, PhaseFuture<Arc<ConsumeEventsContext>>)> = Vec::new();
        let mut produce: Vec<(String, PhaseFuture<Arc<ProduceEventsContext>>)> = Vec::new();

        for (producer_name, producer) in self.env.services() {
            for consumer_config in &producer.context.event_consumers {
                let consumer_name = consumer_config.service_name.as_str();
                let consumer = self.env.service(consumer_name)?;
                let producer_deploy = lookup(deployed, Phase::Deploy, producer_name)?;
                let consumer_deploy = lookup(deployed, Phase::Deploy, consumer_name)?;

                let key = relationship_key(consumer_name, producer_name);
                let own = consumer.context.clone();
                let other = producer.context.clone();
                let operation = if consumer.deployer.supports(Phase::ConsumeEvents) {
                    debug!("Consuming events from service {}", key);
                    let deployer = consumer.deployer.clone();
                    let own_deploy = consumer_deploy.clone();
                    let other_deploy = producer_deploy.clone();
                    let on_error = phase_error(Phase::ConsumeEvents, key.clone());
                    async move {
                        deployer
                            .consume_events(&own, &own_deploy, &other, &other_deploy)
                            .await
                            .map(Arc::new)
                            .map_err(on_error)
                    }
                    .boxed()
                } else {
                    futures::future::ready(Ok(Arc::new(ConsumeEventsContext::not_required(
                        &own, &other,
                    ))))
                    .boxed()
                };
                consume.push((key, operation));

                let key = relationship_key(producer_name, consumer_name);
                let own = producer.context.clone();
                let other = consumer.context.clone();
                let operation = if producer.deployer.supports(Phase::ProduceEvents) {
                    debug!("Producing events for service {}", key);
                    let deployer = producer.deployer.clone();
                    let consumer_config = consumer_config.clone();
                    let on_error = phase_error(Phase::ProduceEvents, key.clone());
                    async move {
                        deployer
                            .produce_events(
                                &own,
                                &producer_deploy,
                                &consumer_config,
                                &other,
                                &consumer_deploy,
                            )
                            .await
                            .map(Arc::new)
                            .map_err(on_error)
                    }
                    .boxed()
                } else {
                    futures::future::ready(Ok(Arc::new(ProduceEventsContext::not_required(
                        &own, &other,
                    ))))
                    .boxed()
                };
                produce.push((key, operation));
            }
        }

        let spawner = self.spawner.as_ref();
        futures::try_join!(
            join_all(spawner, Phase::ConsumeEvents, consume),
            join_all(spawner, Phase::ProduceEvents, produce),
        )
    }
}
