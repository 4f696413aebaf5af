use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One task's line in a throughput snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub name: String,
    /// Smoothed speed in Mbps
    pub mbps: f64,
    /// Bytes observed since the session started
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskReport {
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Everything the reporter computed on a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSnapshot {
    /// 1-based tick counter
    pub tick: u64,
    /// Time since the reporter started
    pub elapsed: Duration,
    pub tasks: Vec<TaskReport>,
    /// Sum of every task's smoothed speed
    pub total_mbps: f64,
}

/// Events produced by the sampling loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ThroughputEvent {
    Tick(ThroughputSnapshot),

    /// Reporter exited; no further ticks follow
    Stopped { ticks: u64 },
}
