//! Core configuration sections

use ratewatch_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Sampling configuration for the reporter loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            window_secs: default_window_secs(),
        }
    }
}

impl SamplingConfig {
    /// Reporter tick interval
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Trailing smoothing window
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            max_workers: default_max_workers(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Sequential probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_duration")]
    pub duration_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_probe_duration(),
        }
    }
}

impl ProbeConfig {
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

/// A named download link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub name: String,
    pub url: String,
}

impl LinkConfig {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Parses `NAME=URL`; only the first `=` separates the name.
impl FromStr for LinkConfig {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (name, url) = input
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "link".to_string(),
                value: input.to_string(),
            })?;

        let name = name.trim();
        let url = url.trim();
        if name.is_empty() || url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "link".to_string(),
                value: input.to_string(),
            }
            .into());
        }

        Ok(Self::new(name, url))
    }
}

// Default value functions for serde
fn default_tick_ms() -> u64 {
    1000
}

fn default_window_secs() -> u64 {
    10
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_max_workers() -> usize {
    10
}

fn default_user_agent() -> String {
    format!("ratewatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_probe_duration() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_spec_splits_on_first_equals() {
        let link: LinkConfig = "mirror=https://example.com/file?a=b".parse().unwrap();
        assert_eq!(link.name, "mirror");
        assert_eq!(link.url, "https://example.com/file?a=b");
    }

    #[test]
    fn link_spec_requires_both_halves() {
        assert!("no-equals".parse::<LinkConfig>().is_err());
        assert!("=https://example.com".parse::<LinkConfig>().is_err());
        assert!("name=".parse::<LinkConfig>().is_err());
    }

    #[test]
    fn defaults_match_reference_values() {
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.tick(), Duration::from_secs(1));
        assert_eq!(sampling.window(), Duration::from_secs(10));
        assert_eq!(NetworkConfig::default().connect_timeout(), Duration::from_secs(15));
        assert_eq!(NetworkConfig::default().max_workers, 10);
        assert_eq!(ProbeConfig::default().duration(), Duration::from_secs(5));
    }
}
