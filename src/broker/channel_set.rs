//! Channel set implementation
//!
//! A channel set is one isolated namespace of channels. It maps each channel
//! id to the registrations currently joined to it and performs the fan-out
//! of published messages. All state sits behind a single lock, so subscribe,
//! publish, cancel and delete are totally ordered within a set.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;

use super::config::DEFAULT_QUEUE_CAPACITY;
use super::error::BrokerError;
use super::message::{Abbrev, AbbrevList, Message};
use super::slots::{SlotKey, SlotList};
use super::subscription::{Subscription, SubscriptionId};

/// Broker-side half of a subscription
struct Registration {
    /// Sending half of the subscription queue; dropping it closes the queue
    tx: mpsc::Sender<Message>,
    /// One removal handle per joined channel
    handles: Vec<(String, SlotKey)>,
}

#[derive(Default)]
struct SetState {
    /// Channel id to the subscriptions joined to it. A present channel
    /// always has at least one entry.
    channels: HashMap<String, SlotList<SubscriptionId>>,
    /// Live registrations by subscription
    registrations: HashMap<SubscriptionId, Registration>,
}

impl SetState {
    /// Drop a registration's handles from every channel except `skip`,
    /// removing channels that become empty.
    fn unlink(&mut self, registration: &Registration, skip: Option<&str>) {
        for (channel_id, key) in &registration.handles {
            if skip == Some(channel_id.as_str()) {
                continue;
            }

            if let Some(slots) = self.channels.get_mut(channel_id) {
                slots.remove(*key);
                if slots.is_empty() {
                    self.channels.remove(channel_id);
                }
            }
        }
    }
}

/// Statistics for a channel set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSetStats {
    /// Number of channels with at least one subscriber
    pub channel_count: usize,
    /// Number of live subscriptions
    pub subscription_count: usize,
}

/// One namespace of channels
pub struct ChannelSet {
    name: String,
    queue_capacity: usize,
    state: Mutex<SetState>,
}

impl ChannelSet {
    /// Create an empty channel set with the default queue capacity
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_queue_capacity(name, DEFAULT_QUEUE_CAPACITY)
    }

    /// Create an empty channel set with a custom queue capacity
    pub fn with_queue_capacity(name: impl Into<String>, queue_capacity: usize) -> Self {
        Self {
            name: name.into(),
            queue_capacity: queue_capacity.max(1),
            state: Mutex::new(SetState::default()),
        }
    }

    /// Name of this set
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a new subscription on all given channels at once
    ///
    /// Channels that don't exist yet are created. Repeated ids are joined
    /// once. Nothing published before this call can reach the new queue,
    /// and everything published after it returns can.
    pub async fn subscribe(&self, channel_ids: &[String]) -> Result<Subscription, BrokerError> {
        if channel_ids.is_empty() {
            return Err(BrokerError::EmptyChannelList);
        }

        let mut seen = HashSet::with_capacity(channel_ids.len());
        let ids: Vec<String> = channel_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let id = SubscriptionId::next();
        let (tx, rx) = mpsc::channel(self.queue_capacity);

        let mut state = self.state.lock().await;

        let handles = ids
            .iter()
            .map(|channel_id| {
                let key = state
                    .channels
                    .entry(channel_id.clone())
                    .or_default()
                    .insert(id);
                (channel_id.clone(), key)
            })
            .collect();

        state.registrations.insert(id, Registration { tx, handles });

        tracing::info!(
            set = %Abbrev::str(&self.name),
            channels = %AbbrevList(&ids),
            subscription = %id,
            "Subscribed client"
        );

        Ok(Subscription::new(id, ids, rx))
    }

    /// Remove a subscription from all of its channels and close its queue
    ///
    /// Channels left without subscribers are removed. If the broker already
    /// closed the subscription (its channels were deleted) this does nothing.
    pub async fn cancel_subscription(&self, subscription: Subscription) {
        let id = subscription.id();
        let mut state = self.state.lock().await;

        let Some(registration) = state.registrations.remove(&id) else {
            tracing::debug!(
                set = %Abbrev::str(&self.name),
                subscription = %id,
                "Subscription already closed"
            );
            return;
        };

        state.unlink(&registration, None);

        tracing::info!(
            set = %Abbrev::str(&self.name),
            channels = %AbbrevList(subscription.channel_ids()),
            subscription = %id,
            "Cancelled subscription"
        );

        // Dropping the registration drops the only sender and closes the queue
    }

    /// Deliver a message to every subscriber of the given channels
    ///
    /// Never waits: a subscriber whose queue is full misses the message.
    /// Unknown channels are skipped. Returns the number of queues the message
    /// landed in; a subscriber joined to several of the listed channels is
    /// counted once per channel.
    pub async fn publish(&self, channel_ids: &[String], msg: Message) -> Result<usize, BrokerError> {
        let mut delivered = 0;
        let mut dropped = 0;
        let mut abandoned = Vec::new();

        let mut state = self.state.lock().await;

        for channel_id in channel_ids {
            let Some(slots) = state.channels.get(channel_id) else {
                continue;
            };

            for sub_id in slots.values() {
                let Some(registration) = state.registrations.get(sub_id) else {
                    continue;
                };

                match registration.tx.try_send(msg.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => dropped += 1,
                    Err(TrySendError::Closed(_)) => abandoned.push(*sub_id),
                }
            }
        }

        // Consumers that went away without cancelling
        for sub_id in abandoned {
            if let Some(registration) = state.registrations.remove(&sub_id) {
                state.unlink(&registration, None);
                tracing::debug!(
                    set = %Abbrev::str(&self.name),
                    subscription = %sub_id,
                    "Reaped abandoned subscription"
                );
            }
        }

        drop(state);

        if delivered == 0 {
            tracing::info!(
                set = %Abbrev::str(&self.name),
                channels = %AbbrevList(channel_ids),
                payload = %Abbrev(&msg.payload),
                dropped = dropped,
                "Lost message"
            );
        } else {
            tracing::info!(
                set = %Abbrev::str(&self.name),
                channels = %AbbrevList(channel_ids),
                payload = %Abbrev(&msg.payload),
                delivered = delivered,
                dropped = dropped,
                "Published message"
            );
        }

        Ok(delivered)
    }

    /// Tear down channels, closing every subscription joined to them
    ///
    /// A closed subscription loses all of its registrations, including those
    /// on channels that were not deleted. Fails only if none of the
    /// requested channels existed.
    pub async fn delete_channels(&self, channel_ids: &[String]) -> Result<(), BrokerError> {
        let mut failed = 0;
        let mut state = self.state.lock().await;

        for channel_id in channel_ids {
            let Some(slots) = state.channels.remove(channel_id) else {
                failed += 1;
                continue;
            };

            let mut closed = 0;
            for sub_id in slots.values() {
                if let Some(registration) = state.registrations.remove(sub_id) {
                    state.unlink(&registration, Some(channel_id.as_str()));
                    closed += 1;
                }
            }

            tracing::info!(
                set = %Abbrev::str(&self.name),
                channel = %Abbrev::str(channel_id),
                closed = closed,
                "Deleted channel"
            );
        }

        if failed == channel_ids.len() {
            tracing::debug!(
                set = %Abbrev::str(&self.name),
                channels = %AbbrevList(channel_ids),
                "Delete requested for missing channels"
            );
            return Err(BrokerError::ChannelsNotFound(channel_ids.to_vec()));
        }

        Ok(())
    }

    /// Check whether a channel currently has subscribers
    pub async fn has_channel(&self, channel_id: &str) -> bool {
        self.state.lock().await.channels.contains_key(channel_id)
    }

    /// Number of subscriptions joined to a channel
    pub async fn subscriber_count(&self, channel_id: &str) -> usize {
        self.state
            .lock()
            .await
            .channels
            .get(channel_id)
            .map_or(0, SlotList::len)
    }

    /// Get set statistics
    pub async fn stats(&self) -> ChannelSetStats {
        let state = self.state.lock().await;
        ChannelSetStats {
            channel_count: state.channels.len(),
            subscription_count: state.registrations.len(),
        }
    }
}

impl std::fmt::Debug for ChannelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSet")
            .field("name", &self.name)
            .field("queue_capacity", &self.queue_capacity)
            .finish_non_exhaustive()
    }
}
