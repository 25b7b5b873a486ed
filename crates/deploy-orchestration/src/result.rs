//! Per-environment results

use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Final status of an environment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployStatus {
    /// Every phase succeeded
    Success,
    /// A check, preflight or phase failed
    Failure,
}

impl fmt::Display for DeployStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployStatus::Success => f.write_str("success"),
            DeployStatus::Failure => f.write_str("failure"),
        }
    }
}

/// Which lifecycle produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Deploy
    Deploy,
    /// Delete
    Delete,
}

/// Outcome of running one environment through a lifecycle
#[derive(Debug, Clone)]
pub struct EnvironmentResult {
    /// Identifier of this run
    pub run_id: Uuid,
    /// Lifecycle that ran
    pub lifecycle: Lifecycle,
    /// Environment name
    pub environment_name: String,
    /// When the environment's run started
    pub start_time: DateTime<Utc>,
    /// When the environment's run finished
    pub end_time: DateTime<Utc>,
    /// Final status
    pub status: DeployStatus,
    /// Human-readable summary
    pub message: String,
    /// Underlying cause of a failure
    pub error: Option<Arc<Error>>,
}

/// Result of deploying one environment
pub type EnvironmentDeployResult = EnvironmentResult;

/// Result of deleting one environment
pub type EnvironmentDeleteResult = EnvironmentResult;

impl EnvironmentResult {
    pub(crate) fn success(
        lifecycle: Lifecycle,
        environment_name: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        let environment_name = environment_name.into();
        let message = match lifecycle {
            Lifecycle::Deploy => format!("Deployed environment '{}'", environment_name),
            Lifecycle::Delete => format!("Deleted environment '{}'", environment_name),
        };

        Self {
            run_id: Uuid::new_v4(),
            lifecycle,
            environment_name,
            start_time,
            end_time: Utc::now(),
            status: DeployStatus::Success,
            message,
            error: None,
        }
    }

    pub(crate) fn failure(
        lifecycle: Lifecycle,
        environment_name: impl Into<String>,
        start_time: DateTime<Utc>,
        error: Error,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            lifecycle,
            environment_name: environment_name.into(),
            start_time,
            end_time: Utc::now(),
            status: DeployStatus::Failure,
            message: error.to_string(),
            error: Some(Arc::new(error)),
        }
    }

    /// Whether the run succeeded
    pub fn is_success(&self) -> bool {
        self.status == DeployStatus::Success
    }

    /// Wall-clock duration of the run
    pub fn elapsed(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

/// Whether every result succeeded
pub fn all_succeeded(results: &[EnvironmentResult]) -> bool {
    results.iter().all(EnvironmentResult::is_success)
}
