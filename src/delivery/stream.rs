//! Streaming delivery loop
//!
//! Drives one subscription to completion, writing each message to a
//! response sink as soon as it arrives.

use bytes::Bytes;

use crate::broker::{ChannelSet, Subscription};

use super::sink::ResponseSink;

/// Terminator written after every payload so each message leaves as its own chunk
pub const LINE_END: &[u8] = b"\r\n";

/// How many messages a subscriber wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Keep streaming until the subscription ends
    Chunked,
    /// Deliver one message, then end the response
    Single,
}

/// Why the delivery loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryEnd {
    /// The broker closed the queue (channel deleted)
    ClosedByBroker,
    /// The client disconnected while waiting for a message
    ClientGone,
    /// Writing or flushing a message failed
    WriteFailed,
    /// The transport cannot stream; one message was delivered best-effort
    FlushUnsupported,
    /// Single-message mode delivered its message
    SingleShot,
}

impl DeliveryEnd {
    /// Whether the loop had to cancel the subscription itself
    pub fn cancelled_by_consumer(&self) -> bool {
        !matches!(self, DeliveryEnd::ClosedByBroker)
    }
}

/// Outcome of a delivery loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Messages fully written to the sink
    pub delivered: u64,
    /// Termination reason
    pub end: DeliveryEnd,
}

/// Stream a subscription into a sink until it ends
///
/// The loop owns `subscription`. It cancels it on `set` exactly once on
/// every exit except [`DeliveryEnd::ClosedByBroker`], where the broker has
/// already removed the registration.
pub async fn run<S: ResponseSink>(
    set: &ChannelSet,
    mut subscription: Subscription,
    sink: &mut S,
    mode: DeliveryMode,
) -> DeliveryReport {
    let sub_id = subscription.id();
    let mut delivered = 0;

    let end = loop {
        let next = tokio::select! {
            msg = subscription.recv() => msg,
            _ = sink.closed() => break DeliveryEnd::ClientGone,
        };

        let Some(msg) = next else {
            break DeliveryEnd::ClosedByBroker;
        };

        // Transports that send headers once keep the first message's type
        sink.set_content_type(&msg.content_type);

        if let Err(e) = sink.write(msg.payload).await {
            tracing::debug!(subscription = %sub_id, error = %e, "Write failed");
            break DeliveryEnd::WriteFailed;
        }
        if let Err(e) = sink.write(Bytes::from_static(LINE_END)).await {
            tracing::debug!(subscription = %sub_id, error = %e, "Write failed");
            break DeliveryEnd::WriteFailed;
        }
        delivered += 1;

        if mode == DeliveryMode::Single {
            break DeliveryEnd::SingleShot;
        }

        if !sink.supports_flush() {
            break DeliveryEnd::FlushUnsupported;
        }

        if let Err(e) = sink.flush().await {
            tracing::debug!(subscription = %sub_id, error = %e, "Flush failed");
            break DeliveryEnd::WriteFailed;
        }
    };

    if !matches!(end, DeliveryEnd::ClientGone | DeliveryEnd::WriteFailed) {
        if let Err(e) = sink.finish().await {
            tracing::debug!(subscription = %sub_id, error = %e, "Finishing response failed");
        }
    }

    if end.cancelled_by_consumer() {
        set.cancel_subscription(subscription).await;
    }

    tracing::debug!(
        subscription = %sub_id,
        delivered = delivered,
        end = ?end,
        "Delivery finished"
    );

    DeliveryReport { delivered, end }
}
