#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for ratewatch
//!
//! Download workers only see the [`ByteSource`] / [`ByteStream`] pair. The
//! reqwest-backed [`NetClient`] is the production implementation. With the
//! `test-utils` feature, `memory::ScriptedSource` replays planned chunk
//! sequences offline.

mod client;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
mod source;

pub use client::{HttpStream, NetClient, NetConfig};
pub use source::{ByteSource, ByteStream};

use ratewatch_errors::{Error, NetworkError};
use url::Url;

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
