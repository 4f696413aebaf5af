#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for ratewatch
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/ratewatch/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

mod core;

pub use self::core::{LinkConfig, NetworkConfig, ProbeConfig, SamplingConfig};

use ratewatch_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Longest smoothing window accepted, in seconds
pub const MAX_WINDOW_SECS: u64 = 60 * 60;

/// Longest per-link probe accepted, in seconds
pub const MAX_PROBE_SECS: u64 = 60 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub links: Vec<LinkConfig>,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("ratewatch").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = match fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), "loaded config file");

        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid TOML for this schema.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            debug!("no config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // RATEWATCH_TICK_MS
        if let Ok(tick) = std::env::var("RATEWATCH_TICK_MS") {
            self.sampling.tick_ms = tick.parse().map_err(|_| ConfigError::InvalidValue {
                field: "RATEWATCH_TICK_MS".to_string(),
                value: tick,
            })?;
        }

        // RATEWATCH_WINDOW_SECS
        if let Ok(window) = std::env::var("RATEWATCH_WINDOW_SECS") {
            self.sampling.window_secs =
                window.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "RATEWATCH_WINDOW_SECS".to_string(),
                    value: window,
                })?;
        }

        // RATEWATCH_MAX_WORKERS
        if let Ok(workers) = std::env::var("RATEWATCH_MAX_WORKERS") {
            self.network.max_workers =
                workers.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "RATEWATCH_MAX_WORKERS".to_string(),
                    value: workers,
                })?;
        }

        // RATEWATCH_CONNECT_TIMEOUT
        if let Ok(timeout) = std::env::var("RATEWATCH_CONNECT_TIMEOUT") {
            self.network.connect_timeout_secs =
                timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "RATEWATCH_CONNECT_TIMEOUT".to_string(),
                    value: timeout,
                })?;
        }

        Ok(())
    }

    /// Check values that serde cannot check on its own
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an interval that is zero or out of
    /// range, a tick longer than the window, an empty link list, an
    /// unparseable URL, or a repeated link name.
    pub fn validate(&self) -> Result<(), Error> {
        let sampling = &self.sampling;
        if sampling.window_secs == 0 || sampling.window_secs > MAX_WINDOW_SECS {
            return Err(invalid(
                "sampling.window_secs",
                &sampling.window_secs.to_string(),
            ));
        }
        if sampling.tick_ms == 0 || sampling.tick() > sampling.window() {
            return Err(invalid("sampling.tick_ms", &sampling.tick_ms.to_string()));
        }
        if self.network.max_workers == 0 {
            return Err(invalid("network.max_workers", "0"));
        }
        if self.probe.duration_secs == 0 || self.probe.duration_secs > MAX_PROBE_SECS {
            return Err(invalid(
                "probe.duration_secs",
                &self.probe.duration_secs.to_string(),
            ));
        }
        if self.links.is_empty() {
            return Err(ConfigError::MissingField {
                field: "links".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for link in &self.links {
            if link.name.trim().is_empty() {
                return Err(invalid("links.name", &link.name));
            }
            if url::Url::parse(&link.url).is_err() {
                return Err(invalid("links.url", &link.url));
            }
            if !seen.insert(link.name.as_str()) {
                return Err(ConfigError::DuplicateLink {
                    name: link.name.clone(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Number of concurrent download workers: `min(links, max_workers)`
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.links.len().min(self.network.max_workers).max(1)
    }
}

fn invalid(field: &str, value: &str) -> Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}
