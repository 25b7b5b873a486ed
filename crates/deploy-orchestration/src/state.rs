//! Working sets of phase contexts
//!
//! One environment run accumulates the context every phase returns. Entries
//! are keyed by the service (or relationship) that produced them and each key
//! is written exactly once, so the maps need no locking while a phase runs.

use crate::{
    BindContext, ConsumeEventsContext, DeployContext, PreDeployContext, ProduceEventsContext,
    UnBindContext, UnDeployContext, UnPreDeployContext,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Contexts produced by a deploy run
#[derive(Debug, Clone, Default)]
pub struct DeployState {
    /// Pre-deploy contexts by service
    pub pre_deploy: BTreeMap<String, Arc<PreDeployContext>>,
    /// Bind contexts by `dependent->dependency`
    pub bind: BTreeMap<String, Arc<BindContext>>,
    /// Deploy contexts by service
    pub deploy: BTreeMap<String, Arc<DeployContext>>,
    /// Consume-events contexts by `consumer->producer`
    pub consume_events: BTreeMap<String, Arc<ConsumeEventsContext>>,
    /// Produce-events contexts by `producer->consumer`
    pub produce_events: BTreeMap<String, Arc<ProduceEventsContext>>,
}

/// Contexts produced by a teardown run
#[derive(Debug, Clone, Default)]
pub struct TeardownState {
    /// Pre-deploy contexts looked up before tearing down
    pub pre_deploy: BTreeMap<String, Arc<PreDeployContext>>,
    /// Un-deploy contexts by service
    pub un_deploy: BTreeMap<String, Arc<UnDeployContext>>,
    /// Un-bind contexts by `dependent->dependency`
    pub un_bind: BTreeMap<String, Arc<UnBindContext>>,
    /// Un-pre-deploy contexts by service
    pub un_pre_deploy: BTreeMap<String, Arc<UnPreDeployContext>>,
}

/// Key for a relationship between two services
pub(crate) fn relationship_key(from: &str, to: &str) -> String {
    format!("{from}->{to}")
}
