//! Operation results returned to the CLI

use ratewatch_errors::{Error, OpsError};
use ratewatch_events::ProbeResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Final state of one task after a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub name: String,
    pub url: String,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a concurrent watch session observed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    /// Tasks in link order
    pub tasks: Vec<TaskSummary>,
    pub total_bytes: u64,
    pub ticks: u64,
    pub elapsed: Duration,
    /// Stop was requested rather than every stream ending on its own
    pub interrupted: bool,
}

impl SessionSummary {
    #[must_use]
    pub fn failed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.error.is_some()).count()
    }
}

/// A link the probe could not measure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of the sequential probe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    pub results: Vec<ProbeResult>,
    pub failures: Vec<ProbeFailure>,
    pub interrupted: bool,
}

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    Session(SessionSummary),
    Probe(ProbeReport),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be serialized.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// A session succeeds while at least one task survives; a probe only
    /// when no link failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::Session(summary) => summary.failed_tasks() < summary.tasks.len(),
            OperationResult::Probe(report) => report.failures.is_empty(),
        }
    }
}
