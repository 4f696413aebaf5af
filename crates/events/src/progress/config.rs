//! Configuration for throughput estimation

use std::time::Duration;

/// Parameters shared by every task's estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedConfig {
    /// Trailing window over which samples are weighted (default: 10s)
    pub window: Duration,
    /// Nominal sampling interval (default: 1s)
    pub tick: Duration,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10),
            tick: Duration::from_secs(1),
        }
    }
}

impl SpeedConfig {
    #[must_use]
    pub fn new(window: Duration, tick: Duration) -> Self {
        Self { window, tick }
    }
}
