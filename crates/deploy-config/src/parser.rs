//! Deploy file parser and conversion into orchestrator types

use crate::{ConfigError, DeployFile, Result, ServiceDeclaration};
use deploy_orchestration::{DEFAULT_PREFIX, EnvironmentSpec, ServiceSpec, ServiceTypeRef};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Pattern app, environment and service names must match
pub const NAME_PATTERN: &str = r"^[a-zA-Z0-9-]+$";

/// Only supported deploy file version
pub const SUPPORTED_VERSION: u32 = 1;

/// Parse a YAML deploy file
pub fn parse_file(path: impl AsRef<Path>) -> Result<DeployFile> {
    let path = path.as_ref();
    debug!("Reading deploy file {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parse a deploy file from a string
pub fn parse_str(content: &str) -> Result<DeployFile> {
    let file: DeployFile = serde_yaml::from_str(content)?;
    validate(&file)?;
    Ok(file)
}

/// Validate a deploy file, reporting every problem found
pub fn validate(file: &DeployFile) -> Result<()> {
    let name_re = Regex::new(NAME_PATTERN)
        .map_err(|e| ConfigError::ValidationError(vec![e.to_string()]))?;
    let mut errors = Vec::new();

    if file.version != SUPPORTED_VERSION {
        errors.push(format!(
            "Unsupported version: {}, expected {}",
            file.version, SUPPORTED_VERSION
        ));
    }

    if !name_re.is_match(&file.name) {
        errors.push(format!(
            "The application name '{}' may only contain alphanumeric characters and dashes",
            file.name
        ));
    }

    if file.environments.is_empty() {
        errors.push("You must specify at least one environment".to_string());
    }

    for (env_name, services) in &file.environments {
        if !name_re.is_match(env_name) {
            errors.push(format!(
                "The environment name '{}' may only contain alphanumeric characters and dashes",
                env_name
            ));
        }

        if services.is_empty() {
            errors.push(format!(
                "The environment '{}' must contain at least one service",
                env_name
            ));
        }

        for (service_name, service) in services {
            if !name_re.is_match(service_name) {
                errors.push(format!(
                    "The service name '{}' in environment '{}' may only contain alphanumeric characters and dashes",
                    service_name, env_name
                ));
            }

            match ServiceTypeRef::parse(&service.service_type) {
                Ok(service_type) => {
                    if service_type.prefix != DEFAULT_PREFIX
                        && !file.extensions.contains_key(&service_type.prefix)
                    {
                        errors.push(format!(
                            "The service '{}' in environment '{}' uses the extension prefix '{}', which is not declared under 'extensions'",
                            service_name, env_name, service_type.prefix
                        ));
                    }
                }
                Err(err) => errors.push(format!(
                    "The service '{}' in environment '{}' has an invalid type: {}",
                    service_name, env_name, err
                )),
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors))
    }
}

/// Convert one declared environment into an [`EnvironmentSpec`]
pub fn environment(file: &DeployFile, name: &str) -> Result<EnvironmentSpec> {
    let services = file
        .environments
        .get(name)
        .ok_or_else(|| ConfigError::EnvironmentNotFound(name.to_string()))?;

    let mut env = EnvironmentSpec::new(&file.name, name);
    env.tags = file.tags.clone();
    for (service_name, declaration) in services {
        env = env.with_service(service_spec(service_name, declaration)?);
    }
    Ok(env)
}

/// Convert every declared environment
pub fn environments(file: &DeployFile) -> Result<BTreeMap<String, EnvironmentSpec>> {
    file.environments
        .keys()
        .map(|name| Ok((name.clone(), environment(file, name)?)))
        .collect()
}

fn service_spec(name: &str, declaration: &ServiceDeclaration) -> Result<ServiceSpec> {
    let service_type = ServiceTypeRef::parse(&declaration.service_type)?;
    let mut spec = ServiceSpec::new(name, service_type);
    spec.dependencies = declaration.dependencies.clone();
    spec.tags = declaration.tags.clone();
    spec.params = declaration.params.clone();
    for consumer in &declaration.event_consumers {
        spec = spec.with_event_consumer(&consumer.service_name);
    }
    Ok(spec)
}
