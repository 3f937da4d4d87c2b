//! Subscriber-side streaming
//!
//! Turns a [`Subscription`](crate::broker::Subscription) into a streamed
//! response. Each message is written as `payload\r\n` and flushed on its
//! own, so clients see one chunk per message.
//!
//! The loop is the single place a subscriber waits for an unbounded time.
//! It ends when the broker closes the subscription, the client goes away,
//! a write fails, or (in single mode) after the first message.

pub mod sink;
pub mod stream;

pub use sink::ResponseSink;
pub use stream::{run, DeliveryEnd, DeliveryMode, DeliveryReport, LINE_END};
