use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of streaming one link for a fixed duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub name: String,
    pub bytes: u64,
    pub elapsed: Duration,
    /// Average speed over `elapsed`
    pub mbps: f64,
}

/// Events for the sequential link probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProbeEvent {
    Started {
        name: String,
        url: String,
        duration: Duration,
    },

    Measured(ProbeResult),

    Failed { name: String, error: String },
}
