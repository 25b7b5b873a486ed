//! Check phase
//!
//! Runs without side effects and collects every problem it finds instead of
//! stopping at the first one.

use super::PhaseExecutor;
use crate::prepare::PreparedService;
use crate::{PreparedEnvironment, ServiceContext};
use tracing::{debug, info};

impl PhaseExecutor {
    /// Validate every service, returning all errors found
    ///
    /// Each message is prefixed with the service it concerns.
    pub fn check(&self) -> Vec<String> {
        check_environment(&self.env)
    }
}

pub(crate) fn check_environment(env: &PreparedEnvironment) -> Vec<String> {
    info!("Executing Check phase in environment '{}'", env.name());

    let mut errors = Vec::new();
    for (name, service) in env.services() {
        let service_errors = check_service(env, service);
        debug!("Checked service '{}': {} errors", name, service_errors.len());
        errors.extend(
            service_errors
                .into_iter()
                .map(|error| format!("Service '{}' - {}", name, error)),
        );
    }
    errors
}

fn check_service(env: &PreparedEnvironment, service: &PreparedService) -> Vec<String> {
    let own = service.context.as_ref();
    let info = service.deployer.info();

    // Declared order; unknown names were rejected before the phases started
    let dependencies: Vec<(&ServiceContext, &PreparedService)> = own
        .dependencies
        .iter()
        .filter_map(|name| env.service(name).ok())
        .map(|dependency| (dependency.context.as_ref(), dependency))
        .collect();

    let contexts: Vec<&ServiceContext> = dependencies.iter().map(|(ctx, _)| *ctx).collect();
    let mut errors = service.deployer.check(own, &contexts);

    for (dependency, prepared) in &dependencies {
        let produced = prepared.deployer.info().produced_deploy_output_types;
        let consumable = !produced.is_empty()
            && produced
                .iter()
                .all(|output| info.consumed_deploy_output_types.contains(output));
        if !consumable {
            errors.push(format!(
                "The '{}' service type is not consumable by the '{}' service type",
                dependency.service_type.name, own.service_type.name
            ));
        }
    }

    for consumer in &own.event_consumers {
        let Ok(prepared) = env.service(&consumer.service_name) else {
            errors.push(format!(
                "You declared an event consumer '{}' that doesn't exist",
                consumer.service_name
            ));
            continue;
        };

        let consumer_type = &prepared.context.service_type;
        let supported = info
            .produced_events_supported_services
            .iter()
            .any(|supported| {
                *supported == consumer_type.name || *supported == consumer_type.to_string()
            });
        if !supported {
            errors.push(format!(
                "The '{}' service type can't consume events from the '{}' service type",
                consumer_type.name, own.service_type.name
            ));
        }
    }

    if info.supports_tagging {
        errors.extend(
            own.account
                .required_tags
                .iter()
                .filter(|tag| !own.tags.contains_key(tag.as_str()))
                .map(|tag| {
                    format!(
                        "Tagging - {} - Missing required tag '{}'. You can apply this tag at either the application or service level.",
                        own.service_name, tag
                    )
                }),
        );
    }

    errors
}
