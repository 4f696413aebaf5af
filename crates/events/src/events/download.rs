use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::FailureContext;

/// Per-link download lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Worker picked up the link and is opening the stream
    Started { task: String, url: String },

    /// Response headers received; body is about to be read
    Connected {
        task: String,
        url: String,
        content_length: Option<u64>,
    },

    /// Body read to the end
    Completed {
        task: String,
        bytes: u64,
        elapsed: Duration,
    },

    /// Stream could not be opened or broke mid-body
    Failed {
        task: String,
        url: String,
        failure: FailureContext,
        bytes: u64,
    },

    /// Worker stopped because the session was cancelled
    Cancelled { task: String, bytes: u64 },
}

impl DownloadEvent {
    /// Name of the task this event belongs to
    #[must_use]
    pub fn task(&self) -> &str {
        match self {
            Self::Started { task, .. }
            | Self::Connected { task, .. }
            | Self::Completed { task, .. }
            | Self::Failed { task, .. }
            | Self::Cancelled { task, .. } => task,
        }
    }
}
