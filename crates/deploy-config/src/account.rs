//! Account configuration loading
//!
//! The account config is given either as a path to a YAML (or JSON) file, or
//! inline as base64-encoded JSON. A path that exists on disk always wins.

use crate::{ConfigError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use deploy_orchestration::AccountConfig;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

const REQUIRED_FIELDS: &[&str] = &["account_id", "region"];

/// Load an account config from a file path or a base64 string
pub fn load_account_config(source: &str) -> Result<AccountConfig> {
    let content = if Path::new(source).exists() {
        debug!("Reading account config file {}", source);
        std::fs::read_to_string(source)?
    } else {
        debug!("Account config is not a file, decoding it as base64");
        String::from_utf8(STANDARD.decode(source.trim())?)?
    };
    parse_account_config(&content)
}

/// Parse an account config document
///
/// Numeric account ids are accepted and kept as strings.
pub fn parse_account_config(content: &str) -> Result<AccountConfig> {
    let mut mapping: Mapping = serde_yaml::from_str(content)?;

    let mut errors = Vec::new();
    for field in REQUIRED_FIELDS {
        match mapping.get(*field) {
            None | Some(Value::Null) => errors.push(format!(
                "'{}' field missing in the account config file",
                field
            )),
            Some(Value::Number(n)) => {
                let text = n.to_string();
                mapping.insert(Value::from(*field), Value::from(text));
            }
            Some(_) => {}
        }
    }
    if !errors.is_empty() {
        return Err(ConfigError::ValidationError(errors));
    }

    let account: AccountConfig = serde_yaml::from_value(Value::Mapping(mapping))?;
    account.validate()?;
    Ok(account)
}
