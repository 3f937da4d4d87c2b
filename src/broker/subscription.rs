//! Subscription handle
//!
//! A `Subscription` is the consumer side of one registration in a channel
//! set. It owns the receiving end of a bounded queue; the channel set keeps
//! the sending end and is the only party that ever closes it.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use super::message::Message;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a subscription, never reused within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(super) fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// One consumer's registration on one or more channels
///
/// Hand it back to [`ChannelSet::cancel_subscription`] when done, unless
/// [`recv`](Self::recv) already returned `None` (the broker closed it).
///
/// [`ChannelSet::cancel_subscription`]: super::ChannelSet::cancel_subscription
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    channel_ids: Vec<String>,
    rx: mpsc::Receiver<Message>,
}

impl Subscription {
    pub(super) fn new(
        id: SubscriptionId,
        channel_ids: Vec<String>,
        rx: mpsc::Receiver<Message>,
    ) -> Self {
        Self {
            id,
            channel_ids,
            rx,
        }
    }

    /// Subscription id
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Channels this subscription was registered on, in request order
    pub fn channel_ids(&self) -> &[String] {
        &self.channel_ids
    }

    /// Wait for the next message
    ///
    /// Buffered messages are still handed out after the broker closed the
    /// queue. Returns `None` once the queue is closed and drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Take the next buffered message without waiting
    ///
    /// Returns `Ok(None)` if nothing is buffered yet, and
    /// `Err(TryRecvError::Disconnected)` once closed and drained.
    pub fn try_recv(&mut self) -> Result<Option<Message>, TryRecvError> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Number of messages waiting in the queue
    pub fn buffered(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = SubscriptionId::next();
        let b = SubscriptionId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_recv_drains_before_close() {
        let (tx, rx) = mpsc::channel(2);
        let mut sub = Subscription::new(SubscriptionId::next(), vec!["c".into()], rx);

        tx.try_send(Message::text("one")).unwrap();
        drop(tx);

        assert_eq!(sub.buffered(), 1);
        assert_eq!(sub.recv().await.unwrap().payload, "one");
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn test_try_recv_states() {
        let (tx, rx) = mpsc::channel(1);
        let mut sub = Subscription::new(SubscriptionId::next(), vec!["c".into()], rx);

        assert!(matches!(sub.try_recv(), Ok(None)));
        tx.try_send(Message::text("x")).unwrap();
        assert!(matches!(sub.try_recv(), Ok(Some(_))));
        drop(tx);
        assert!(matches!(sub.try_recv(), Err(TryRecvError::Disconnected)));
    }
}
