//! # Deploy Configuration
//!
//! YAML configuration parser for stack deployments.
//!
//! This crate parses deploy files and account configuration and converts them
//! into the orchestrator's [`EnvironmentSpec`](deploy_orchestration::EnvironmentSpec)
//! and [`AccountConfig`](deploy_orchestration::AccountConfig) types.

#![warn(missing_docs)]

use deploy_orchestration::{Tags, deserialize_tags};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

pub mod account;
pub mod parser;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Account config was neither a file nor valid base64
    #[error("Failed to decode base64 account config: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// Decoded account config was not UTF-8
    #[error("Account config is not valid UTF-8: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    /// Invalid configuration, one message per problem
    #[error("Invalid configuration:\n{}", .0.join("\n"))]
    ValidationError(Vec<String>),

    /// Requested environment is not declared
    #[error("Environment not found in the deploy file: {0}")]
    EnvironmentNotFound(String),

    /// Conversion into orchestrator types failed
    #[error(transparent)]
    Orchestration(#[from] deploy_orchestration::Error),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root of a deploy file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployFile {
    /// File format version, currently always 1
    pub version: u32,

    /// Application name
    pub name: String,

    /// Application-level tags
    #[serde(
        default,
        deserialize_with = "deserialize_tags",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub tags: Tags,

    /// Extension packages keyed by the prefix their service types use
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, String>,

    /// Environments keyed by name, each a map of services keyed by name
    pub environments: BTreeMap<String, BTreeMap<String, ServiceDeclaration>>,
}

/// A service as written in the deploy file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDeclaration {
    /// `type` or `prefix::type`
    #[serde(rename = "type")]
    pub service_type: String,

    /// Services this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    /// Services that consume this one's events
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_consumers: Vec<EventConsumerDeclaration>,

    /// Service-level tags
    #[serde(
        default,
        deserialize_with = "deserialize_tags",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub tags: Tags,

    /// Everything else, passed through to the deployer
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// An entry of a service's `event_consumers` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConsumerDeclaration {
    /// Name of the consuming service
    pub service_name: String,
}
