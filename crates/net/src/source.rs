//! The byte-stream seam between download workers and the network

use bytes::Bytes;
use ratewatch_errors::Error;
use std::future::Future;

/// An open response body of unknown total length
pub trait ByteStream: Send {
    /// Read the next chunk of the body.
    ///
    /// Returns `Ok(None)` once the body has been read to the end.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Bytes>, Error>> + Send;

    /// Declared body length, when the server sent one
    fn content_length(&self) -> Option<u64> {
        None
    }
}

/// Something that can open a [`ByteStream`] for a locator
pub trait ByteSource: Send + Sync {
    type Stream: ByteStream + 'static;

    /// Open a stream for `url`.
    ///
    /// Fails with a `NetworkError` when the connection cannot be
    /// established in time or the server refuses the request.
    fn open(&self, url: &str) -> impl Future<Output = Result<Self::Stream, Error>> + Send;
}
