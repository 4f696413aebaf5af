//! Windowed speed estimation with linear age weighting

use super::config::SpeedConfig;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One tick's instantaneous measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    pub timestamp: Instant,
    /// Instantaneous speed in Mbps
    pub mbps: f64,
}

/// Convert a byte delta observed over `elapsed` into megabits per second.
///
/// A zero `elapsed` is treated as one second.
#[must_use]
pub fn bytes_to_mbps(delta_bytes: u64, elapsed: Duration) -> f64 {
    let mbps = delta_bytes as f64 * 8.0 / 1_000_000.0;
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 && elapsed != Duration::from_secs(1) {
        mbps / secs
    } else {
        mbps
    }
}

/// Time-ordered sample history for one task.
///
/// A sample stamped `t` measures the tick interval `[t - tick, t]`. It is
/// dropped once that interval began more than one window ago, so with a
/// 10s window and 1s tick a sample lives for exactly ten ticks. The
/// smoothed value weights a sample by `age / window`, so the newest sample
/// carries weight zero and older ones count more until they expire.
#[derive(Debug, Clone)]
pub struct SpeedWindow {
    samples: VecDeque<SpeedSample>,
    config: SpeedConfig,
}

impl SpeedWindow {
    #[must_use]
    pub fn new(config: SpeedConfig) -> Self {
        Self {
            samples: VecDeque::new(),
            config,
        }
    }

    /// Record the bytes observed during the last tick and return the
    /// smoothed speed in Mbps.
    ///
    /// A timestamp earlier than the newest recorded sample is clamped to it
    /// so the history stays ordered.
    pub fn record(&mut self, now: Instant, delta_bytes: u64) -> f64 {
        let now = self
            .samples
            .back()
            .map_or(now, |newest| newest.timestamp.max(now));
        let instantaneous = bytes_to_mbps(delta_bytes, self.config.tick);

        self.samples.push_back(SpeedSample {
            timestamp: now,
            mbps: instantaneous,
        });
        self.prune(now);

        self.smoothed(now).unwrap_or(instantaneous)
    }

    /// Weighted average of the retained samples as seen at `now`.
    ///
    /// Returns `None` when the weights sum to zero, which happens when the
    /// only retained samples share the newest timestamp.
    #[must_use]
    pub fn smoothed(&self, now: Instant) -> Option<f64> {
        let window = self.config.window.as_secs_f64();
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;

        for sample in &self.samples {
            let weight = now.saturating_duration_since(sample.timestamp).as_secs_f64() / window;
            weighted_sum += sample.mbps * weight;
            weight_sum += weight;
        }

        (weight_sum > 0.0).then(|| weighted_sum / weight_sum)
    }

    /// Drop samples whose interval started strictly more than a window ago
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.samples.front() {
            let span = now
                .saturating_duration_since(oldest.timestamp)
                .saturating_add(self.config.tick);
            if span > self.config.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn samples(&self) -> impl Iterator<Item = &SpeedSample> {
        self.samples.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn config(&self) -> &SpeedConfig {
        &self.config
    }
}
