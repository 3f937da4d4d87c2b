//! HTTP response sink
//!
//! Bridges the delivery loop, which runs in its own task, to the handler
//! that owns the HTTP response. The response head is sent on the first
//! write, carrying the content type set before it. Every flush becomes one
//! body frame, which hyper sends as one chunk.

use std::convert::Infallible;
use std::io;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use tokio::sync::{mpsc, oneshot};

use crate::broker::DEFAULT_CONTENT_TYPE;
use crate::delivery::ResponseSink;

/// Frames in flight between the delivery task and the response body
const BODY_CHANNEL_CAPACITY: usize = 1;

/// Response head, sent once the first message is written
#[derive(Debug)]
struct ResponseHead {
    content_type: String,
}

fn client_gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected")
}

/// Delivery-loop side of a streamed HTTP response
pub struct HttpSink {
    head_tx: Option<oneshot::Sender<ResponseHead>>,
    content_type: Option<String>,
    body_tx: mpsc::Sender<Bytes>,
    pending: BytesMut,
    streaming: bool,
}

/// Handler side of a streamed HTTP response
pub struct PendingResponse {
    head_rx: oneshot::Receiver<ResponseHead>,
    body_rx: mpsc::Receiver<Bytes>,
}

impl HttpSink {
    /// Create a connected sink and pending response
    ///
    /// `streaming` is false for clients that cannot take a chunked body
    /// (HTTP/1.0); such a sink reports no flush support.
    pub fn new(streaming: bool) -> (Self, PendingResponse) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(BODY_CHANNEL_CAPACITY);

        let sink = Self {
            head_tx: Some(head_tx),
            content_type: None,
            body_tx,
            pending: BytesMut::new(),
            streaming,
        };

        (sink, PendingResponse { head_rx, body_rx })
    }

    fn send_head(&mut self) -> io::Result<()> {
        let Some(head_tx) = self.head_tx.take() else {
            return Ok(());
        };

        let content_type = self
            .content_type
            .take()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        head_tx
            .send(ResponseHead { content_type })
            .map_err(|_| client_gone())
    }

    async fn send_pending(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let frame = self.pending.split().freeze();
        self.body_tx.send(frame).await.map_err(|_| client_gone())
    }
}

impl ResponseSink for HttpSink {
    fn set_content_type(&mut self, content_type: &str) {
        // Headers are fixed once the head has been sent
        if self.head_tx.is_some() {
            self.content_type = Some(content_type.to_string());
        }
    }

    async fn write(&mut self, data: Bytes) -> io::Result<()> {
        self.send_head()?;
        if self.body_tx.is_closed() {
            return Err(client_gone());
        }
        self.pending.extend_from_slice(&data);
        Ok(())
    }

    fn supports_flush(&self) -> bool {
        self.streaming
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.send_pending().await
    }

    async fn closed(&mut self) {
        match self.head_tx.as_mut() {
            Some(head_tx) => head_tx.closed().await,
            None => self.body_tx.closed().await,
        }
    }

    async fn finish(&mut self) -> io::Result<()> {
        self.send_pending().await
    }
}

impl PendingResponse {
    /// Wait for the delivery loop to start the response
    ///
    /// If the loop ends before writing anything (the broker closed the
    /// subscription), the response is an empty `200 OK`.
    pub async fn into_response(self) -> Response {
        let Ok(head) = self.head_rx.await else {
            return StatusCode::OK.into_response();
        };

        let mut body_rx = self.body_rx;
        let frames = async_stream::stream! {
            while let Some(frame) = body_rx.recv().await {
                yield Ok::<Bytes, Infallible>(frame);
            }
        };

        (
            [(header::CONTENT_TYPE, head.content_type)],
            Body::from_stream(frames),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_head_uses_first_content_type() {
        let (mut sink, pending) = HttpSink::new(true);

        let loop_task = tokio::spawn(async move {
            sink.set_content_type("application/json");
            sink.write(Bytes::from_static(b"{}")).await.unwrap();
            sink.set_content_type("text/csv");
            sink.write(Bytes::from_static(b"\r\n")).await.unwrap();
            sink.finish().await.unwrap();
        });

        let response = pending.into_response().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        loop_task.await.unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"{}\r\n");
    }

    #[tokio::test]
    async fn test_each_flush_is_a_frame() {
        let (mut sink, pending) = HttpSink::new(true);
        sink.write(Bytes::from_static(b"one\r\n")).await.unwrap();

        let response = pending.into_response().await;
        let mut frames = response.into_body().into_data_stream();

        let flusher = tokio::spawn(async move {
            sink.flush().await.unwrap();
            sink.write(Bytes::from_static(b"two\r\n")).await.unwrap();
            sink.flush().await.unwrap();
        });

        assert_eq!(frames.next().await.unwrap().unwrap(), "one\r\n");
        assert_eq!(frames.next().await.unwrap().unwrap(), "two\r\n");
        flusher.await.unwrap();
        assert!(frames.next().await.is_none());
    }

    #[tokio::test]
    async fn test_no_head_gives_empty_ok() {
        let (sink, pending) = HttpSink::new(true);
        drop(sink);

        let response = pending.into_response().await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_write_after_disconnect_fails() {
        let (mut sink, pending) = HttpSink::new(true);
        drop(pending);

        let err = sink.write(Bytes::from_static(b"x")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_closed_resolves_when_response_dropped() {
        let (mut sink, pending) = HttpSink::new(true);
        drop(pending);

        tokio::time::timeout(std::time::Duration::from_secs(1), sink.closed())
            .await
            .unwrap();
    }

    #[test]
    fn test_http10_sink_cannot_flush() {
        let (sink, _pending) = HttpSink::new(false);
        assert!(!sink.supports_flush());
    }
}
