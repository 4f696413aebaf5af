//! HTTP implementation of the byte source

use crate::source::{ByteSource, ByteStream};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use ratewatch_config::NetworkConfig;
use ratewatch_errors::{Error, NetworkError};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Bound on connecting and receiving response headers
    pub open_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_secs(15),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: format!("ratewatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(network: &NetworkConfig) -> Self {
        Self {
            open_timeout: network.connect_timeout(),
            user_agent: network.user_agent.clone(),
            ..Self::default()
        }
    }
}

/// HTTP client wrapper
///
/// No overall request timeout is set: bodies are streamed until the end or
/// until the caller stops reading.
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(config.open_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ClientSetup(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(NetConfig::default())
    }

    /// Send a GET and wait for response headers, bounded by the open timeout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` for unparseable URLs, `Timeout` when headers do
    /// not arrive in time, `ConnectionRefused` for connect failures, and
    /// `HttpError` for any non-success status.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        crate::parse_url(url)?;

        let response = tokio::time::timeout(self.config.open_timeout, self.client.get(url).send())
            .await
            .map_err(|_| NetworkError::Timeout {
                url: url.to_string(),
            })?
            .map_err(|e| map_reqwest_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message: status.to_string(),
            }
            .into());
        }

        debug!(url, status = status.as_u16(), "response headers received");
        Ok(response)
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }
}

impl ByteSource for NetClient {
    type Stream = HttpStream;

    async fn open(&self, url: &str) -> Result<HttpStream, Error> {
        let response = self.get(url).await?;
        Ok(HttpStream::new(url, response))
    }
}

/// Response body read chunk by chunk
pub struct HttpStream {
    url: String,
    content_length: Option<u64>,
    body: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl HttpStream {
    fn new(url: &str, response: Response) -> Self {
        Self {
            url: url.to_string(),
            content_length: response.content_length(),
            body: response.bytes_stream().boxed(),
        }
    }
}

impl ByteStream for HttpStream {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self.body.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(map_reqwest_error(&self.url, &e)),
            None => Ok(None),
        }
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

fn map_reqwest_error(url: &str, e: &reqwest::Error) -> Error {
    if e.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
        .into()
    } else if e.is_connect() {
        NetworkError::ConnectionRefused(e.to_string()).into()
    } else {
        NetworkError::DownloadFailed(e.to_string()).into()
    }
}
