//! Operations context for dependency injection

use ratewatch_config::Config;
use ratewatch_errors::{Error, OpsError};
use ratewatch_events::{EventEmitter, EventSender, SpeedConfig};
use ratewatch_net::{ByteSource, NetClient};
use std::sync::Arc;

/// Operations context providing access to all system components
pub struct OpsCtx<S: ByteSource = NetClient> {
    /// Byte source used to open every link
    pub source: Arc<S>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Validated configuration
    pub config: Config,
}

impl<S: ByteSource> OpsCtx<S> {
    /// Estimator parameters derived from the sampling section
    #[must_use]
    pub fn speed_config(&self) -> SpeedConfig {
        SpeedConfig::new(self.config.sampling.window(), self.config.sampling.tick())
    }
}

impl<S: ByteSource> EventEmitter for OpsCtx<S> {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for operations context
pub struct OpsContextBuilder<S: ByteSource = NetClient> {
    source: Option<Arc<S>>,
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl<S: ByteSource> OpsContextBuilder<S> {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            tx: None,
            config: None,
        }
    }

    /// Set byte source
    #[must_use]
    pub fn with_source(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if any required component is missing or the
    /// configuration does not validate.
    pub fn build(self) -> Result<OpsCtx<S>, Error> {
        let source = self.source.ok_or_else(|| OpsError::MissingComponent {
            component: "source".to_string(),
        })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        let config = self.config.ok_or_else(|| OpsError::MissingComponent {
            component: "config".to_string(),
        })?;
        config.validate()?;

        Ok(OpsCtx { source, tx, config })
    }
}

impl<S: ByteSource> Default for OpsContextBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
