//! Service declaration types.
//!
//! This module defines the declarative model for a single service within an
//! environment. Only the name, type and dependency shape matter to the
//! orchestrator; everything else is carried through to the deployers.

use crate::Error;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Extension prefix used for service types declared without one
pub const DEFAULT_PREFIX: &str = "handel";

/// Resource tags, ordered by key
pub type Tags = BTreeMap<String, String>;

/// Deserialize [`Tags`], keeping number and boolean values as their text
///
/// For use with `#[serde(deserialize_with = "deserialize_tags")]`.
pub fn deserialize_tags<'de, D>(deserializer: D) -> std::result::Result<Tags, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, Value>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                other => {
                    return Err(<D::Error as de::Error>::custom(format!(
                        "tag '{}' must be a string, number or boolean, got {}",
                        key, other
                    )));
                }
            };
            Ok((key, text))
        })
        .collect()
}

/// Reference to a deployer implementation: an extension prefix plus a service type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceTypeRef {
    /// Extension prefix the service type is registered under
    pub prefix: String,
    /// Service type name within the prefix
    pub name: String,
}

impl ServiceTypeRef {
    /// Create a reference from its parts
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
        }
    }

    /// Parse `prefix::type`, or a bare `type` under [`DEFAULT_PREFIX`]
    pub fn parse(input: &str) -> Result<Self, Error> {
        let (prefix, name) = match input.split_once("::") {
            Some((prefix, name)) => (prefix.trim(), name.trim()),
            None => (DEFAULT_PREFIX, input.trim()),
        };

        if prefix.is_empty() || name.is_empty() || name.contains("::") {
            return Err(Error::InvalidConfiguration(format!(
                "Invalid service type '{}', expected 'type' or 'prefix::type'",
                input
            )));
        }

        Ok(Self::new(prefix, name))
    }
}

impl fmt::Display for ServiceTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.prefix, self.name)
    }
}

impl FromStr for ServiceTypeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A service that consumes events produced by the declaring service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConsumer {
    /// Name of the consuming service in the same environment
    pub service_name: String,
}

impl EventConsumer {
    /// Create a consumer entry for the named service
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

/// Declaration of one service within an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Service name, unique within its environment
    pub name: String,
    /// Deployer reference resolved through the registry
    pub service_type: ServiceTypeRef,
    /// Services that must be deployed before this one
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Services this one produces events for
    #[serde(default)]
    pub event_consumers: Vec<EventConsumer>,
    /// Service-level tags
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Tags,
    /// Provider-specific parameters, opaque to the orchestrator
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ServiceSpec {
    /// Create a service declaration with no dependencies
    pub fn new(name: impl Into<String>, service_type: ServiceTypeRef) -> Self {
        Self {
            name: name.into(),
            service_type,
            dependencies: Vec::new(),
            event_consumers: Vec::new(),
            tags: Tags::new(),
            params: Map::new(),
        }
    }

    /// Add a dependency
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Add an event consumer
    pub fn with_event_consumer(mut self, service_name: impl Into<String>) -> Self {
        self.event_consumers.push(EventConsumer::new(service_name));
        self
    }

    /// Add a service-level tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a provider parameter
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}
