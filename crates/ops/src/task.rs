//! State shared between one download worker and the reporter

use ratewatch_config::LinkConfig;
use ratewatch_events::ByteCounter;
use std::sync::OnceLock;

/// One link being downloaded.
///
/// The worker writes the byte counter and, at most once, the error. The
/// reporter reads both. The speed history is owned by the reporter alone
/// and lives there.
#[derive(Debug)]
pub struct DownloadTask {
    name: String,
    url: String,
    counter: ByteCounter,
    error: OnceLock<String>,
}

impl DownloadTask {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            counter: ByteCounter::new(),
            error: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn counter(&self) -> &ByteCounter {
        &self.counter
    }

    /// Store the failure message. Returns `false` if one was already set.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.error.set(message.into()).is_ok()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.get().map(String::as_str)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.error.get().is_some()
    }
}

impl From<&LinkConfig> for DownloadTask {
    fn from(link: &LinkConfig) -> Self {
        Self::new(&link.name, &link.url)
    }
}
