//! Environment and account configuration

use crate::{Error, ServiceSpec, Tags, deserialize_tags};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One deployable environment of an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    /// Application name
    pub app_name: String,
    /// Environment name, such as `dev` or `prod`
    pub environment_name: String,
    /// Application-level tags applied to every service
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Tags,
    /// Services keyed by name
    pub services: BTreeMap<String, ServiceSpec>,
}

impl EnvironmentSpec {
    /// Create an empty environment
    pub fn new(app_name: impl Into<String>, environment_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            environment_name: environment_name.into(),
            tags: Tags::new(),
            services: BTreeMap::new(),
        }
    }

    /// Add a service, replacing any previous declaration with the same name
    pub fn with_service(mut self, service: ServiceSpec) -> Self {
        self.services.insert(service.name.clone(), service);
        self
    }

    /// Add an application-level tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Provider account the environments are deployed into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Provider account identifier
    pub account_id: String,
    /// Region to deploy into
    pub region: String,
    /// Tags every taggable service must carry
    #[serde(default)]
    pub required_tags: Vec<String>,
    /// Tags applied to every resource in the account
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub resource_tags: Tags,
    /// Provider-specific settings passed through to deployers
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountConfig {
    /// Create an account config with only the required fields
    pub fn new(account_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            region: region.into(),
            required_tags: Vec::new(),
            resource_tags: Tags::new(),
            extra: Map::new(),
        }
    }

    /// Require a tag on every taggable service
    pub fn with_required_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tags.push(tag.into());
        self
    }

    /// Make sure the required fields are present
    pub fn validate(&self) -> Result<(), Error> {
        let mut missing = Vec::new();
        if self.account_id.trim().is_empty() {
            missing.push("account_id");
        }
        if self.region.trim().is_empty() {
            missing.push("region");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfiguration(format!(
                "account config is missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}
