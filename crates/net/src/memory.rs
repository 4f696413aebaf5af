//! Scripted in-memory byte source
//!
//! Serves pre-planned chunk sequences with `tokio::time` delays, so a paused
//! test clock drives a whole session deterministically.

use crate::source::{ByteSource, ByteStream};
use bytes::Bytes;
use ratewatch_errors::{Error, NetworkError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Step {
    Chunk { after: Duration, len: usize },
    Fail { after: Duration, error: NetworkError },
    Panic { after: Duration },
}

/// Plan for one URL
#[derive(Debug, Clone, Default)]
pub struct Script {
    open_delay: Duration,
    open_error: Option<NetworkError>,
    steps: Vec<Step>,
    endless: bool,
}

impl Script {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay before `open` returns
    #[must_use]
    pub fn open_after(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    /// Make `open` fail with `error`
    #[must_use]
    pub fn fail_open(mut self, error: NetworkError) -> Self {
        self.open_error = Some(error);
        self
    }

    /// Deliver `len` bytes after `after`
    #[must_use]
    pub fn chunk(mut self, after: Duration, len: usize) -> Self {
        self.steps.push(Step::Chunk { after, len });
        self
    }

    /// Deliver `count` chunks of `len` bytes, one every `every`
    #[must_use]
    pub fn steady(mut self, every: Duration, len: usize, count: usize) -> Self {
        self.steps
            .extend((0..count).map(|_| Step::Chunk { after: every, len }));
        self
    }

    /// Break the body after `after`
    #[must_use]
    pub fn fail(mut self, after: Duration, error: NetworkError) -> Self {
        self.steps.push(Step::Fail { after, error });
        self
    }

    /// Panic inside `next_chunk` after `after`, taking the reading task down
    #[must_use]
    pub fn panic(mut self, after: Duration) -> Self {
        self.steps.push(Step::Panic { after });
        self
    }

    /// After the planned steps, stall forever instead of ending the body
    #[must_use]
    pub fn stall(mut self) -> Self {
        self.endless = true;
        self
    }
}

/// In-memory [`ByteSource`] keyed by URL
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    scripts: HashMap<String, Script>,
    open: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ScriptedSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, url: impl Into<String>, script: Script) -> Self {
        self.scripts.insert(url.into(), script);
        self
    }

    /// Streams currently open
    #[must_use]
    pub fn open_streams(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Highest number of streams open at the same time
    #[must_use]
    pub fn peak_streams(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl ByteSource for ScriptedSource {
    type Stream = ScriptedStream;

    async fn open(&self, url: &str) -> Result<ScriptedStream, Error> {
        let script = self
            .scripts
            .get(url)
            .cloned()
            .ok_or_else(|| NetworkError::InvalidUrl(url.to_string()))?;

        tokio::time::sleep(script.open_delay).await;
        if let Some(error) = script.open_error {
            return Err(error.into());
        }

        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_open, Ordering::SeqCst);

        Ok(ScriptedStream {
            steps: script.steps.into(),
            endless: script.endless,
            open: Arc::clone(&self.open),
        })
    }
}

/// Stream produced by [`ScriptedSource`]
#[derive(Debug)]
pub struct ScriptedStream {
    steps: VecDeque<Step>,
    endless: bool,
    open: Arc<AtomicUsize>,
}

impl ByteStream for ScriptedStream {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self.steps.pop_front() {
            Some(Step::Chunk { after, len }) => {
                tokio::time::sleep(after).await;
                Ok(Some(Bytes::from(vec![0u8; len])))
            }
            Some(Step::Fail { after, error }) => {
                tokio::time::sleep(after).await;
                Err(error.into())
            }
            Some(Step::Panic { after }) => {
                tokio::time::sleep(after).await;
                panic!("scripted stream panicked");
            }
            None if self.endless => std::future::pending().await,
            None => Ok(None),
        }
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
