//! Response sink abstraction
//!
//! The delivery loop writes into a `ResponseSink` rather than a concrete
//! HTTP response, which keeps the loop independent of the web framework.

use std::future::Future;
use std::io;

use bytes::Bytes;

/// Outgoing side of a streaming response
pub trait ResponseSink: Send {
    /// Set the response content type
    ///
    /// Only effective until the first write; later calls are ignored by
    /// transports that send headers once.
    fn set_content_type(&mut self, content_type: &str);

    /// Append data to the response
    fn write(&mut self, data: Bytes) -> impl Future<Output = io::Result<()>> + Send;

    /// Whether written data can be pushed to the client incrementally
    fn supports_flush(&self) -> bool;

    /// Push everything written so far to the client
    fn flush(&mut self) -> impl Future<Output = io::Result<()>> + Send;

    /// Resolves once the client is gone
    fn closed(&mut self) -> impl Future<Output = ()> + Send;

    /// Complete the response, delivering anything still buffered
    fn finish(&mut self) -> impl Future<Output = io::Result<()>> + Send;
}
