//! Channel set registry
//!
//! The top-level broker: it maps set names to channel sets and offers the
//! publish, subscribe and delete entry points used by request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::channel_set::{ChannelSet, ChannelSetStats};
use super::config::BrokerConfig;
use super::error::BrokerError;
use super::message::{Abbrev, AbbrevList, Message};
use super::subscription::Subscription;

/// Registry of all channel sets
///
/// Sets are created lazily on first subscribe and are never removed; only
/// their channels come and go. Set names are expected to be long-lived and
/// few.
pub struct Broker {
    /// Map of set name to channel set
    sets: RwLock<HashMap<String, Arc<ChannelSet>>>,

    /// Configuration
    config: BrokerConfig,
}

impl Broker {
    /// Create a new broker with default configuration
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    /// Create a new broker with custom configuration
    pub fn with_config(config: BrokerConfig) -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the broker configuration
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Name used when a caller supplies no set
    pub fn default_set_name(&self) -> &str {
        &self.config.default_set
    }

    fn set_name<'a>(&'a self, name: Option<&'a str>) -> &'a str {
        name.unwrap_or(&self.config.default_set)
    }

    /// Get a channel set, creating it if it doesn't exist
    pub async fn resolve(&self, name: Option<&str>) -> Arc<ChannelSet> {
        let name = self.set_name(name);

        if let Some(set) = self.sets.read().await.get(name) {
            return Arc::clone(set);
        }

        let mut sets = self.sets.write().await;

        // Another task may have created it between the two locks
        let set = sets.entry(name.to_string()).or_insert_with(|| {
            tracing::debug!(set = %Abbrev::str(name), "Channel set created");
            Arc::new(ChannelSet::with_queue_capacity(
                name,
                self.config.queue_capacity,
            ))
        });

        Arc::clone(set)
    }

    /// Get an existing channel set
    pub async fn get(&self, name: Option<&str>) -> Option<Arc<ChannelSet>> {
        let name = self.set_name(name);
        self.sets.read().await.get(name).cloned()
    }

    /// Publish a message on channels of a set
    ///
    /// A set that doesn't exist has no subscribers, so the message is lost
    /// and the set is not created.
    pub async fn publish(
        &self,
        set: Option<&str>,
        channel_ids: &[String],
        msg: Message,
    ) -> Result<usize, BrokerError> {
        match self.get(set).await {
            Some(channel_set) => channel_set.publish(channel_ids, msg).await,
            None => {
                tracing::info!(
                    set = %Abbrev::str(self.set_name(set)),
                    channels = %AbbrevList(channel_ids),
                    "Lost message, channel set doesn't exist"
                );
                Ok(0)
            }
        }
    }

    /// Subscribe to channels of a set, creating the set if needed
    ///
    /// Returns the set alongside the subscription, since cancelling has to
    /// go back to the same set.
    pub async fn subscribe(
        &self,
        set: Option<&str>,
        channel_ids: &[String],
    ) -> Result<(Arc<ChannelSet>, Subscription), BrokerError> {
        let channel_set = self.resolve(set).await;
        let subscription = channel_set.subscribe(channel_ids).await?;
        Ok((channel_set, subscription))
    }

    /// Delete channels of a set
    pub async fn delete_channels(
        &self,
        set: Option<&str>,
        channel_ids: &[String],
    ) -> Result<(), BrokerError> {
        match self.get(set).await {
            Some(channel_set) => channel_set.delete_channels(channel_ids).await,
            None => Err(BrokerError::ChannelsNotFound(channel_ids.to_vec())),
        }
    }

    /// Get statistics for a set
    pub async fn get_set_stats(&self, name: Option<&str>) -> Option<ChannelSetStats> {
        match self.get(name).await {
            Some(set) => Some(set.stats().await),
            None => None,
        }
    }

    /// Get total number of channel sets
    pub async fn set_count(&self) -> usize {
        self.sets.read().await.len()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_resolve_creates_once() {
        let broker = Broker::new();

        let a = broker.resolve(Some("x")).await;
        let b = broker.resolve(Some("x")).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(broker.set_count().await, 1);
    }

    #[tokio::test]
    async fn test_default_set() {
        let broker = Broker::with_config(BrokerConfig::default().default_set("main"));

        let set = broker.resolve(None).await;
        assert_eq!(set.name(), "main");
        assert_eq!(broker.default_set_name(), "main");
        assert!(broker.get(Some("main")).await.is_some());
    }

    #[tokio::test]
    async fn test_sets_are_isolated() {
        let broker = Broker::new();
        let (set_x, mut sub_x) = broker.subscribe(Some("x"), &ids(&["a"])).await.unwrap();
        let (_set_y, mut sub_y) = broker.subscribe(Some("y"), &ids(&["a"])).await.unwrap();

        let delivered = broker
            .publish(Some("x"), &ids(&["a"]), Message::text("only x"))
            .await
            .unwrap();
        assert_eq!(delivered, 1);

        assert_eq!(sub_x.recv().await.unwrap().payload, "only x");
        assert!(matches!(sub_y.try_recv(), Ok(None)));

        set_x.cancel_subscription(sub_x).await;
    }

    #[tokio::test]
    async fn test_publish_to_unknown_set_does_not_create_it() {
        let broker = Broker::new();
        let delivered = broker
            .publish(Some("ghost"), &ids(&["a"]), Message::text("x"))
            .await
            .unwrap();

        assert_eq!(delivered, 0);
        assert!(broker.get(Some("ghost")).await.is_none());
        assert_eq!(broker.set_count().await, 0);
    }

    #[tokio::test]
    async fn test_delete_in_unknown_set() {
        let broker = Broker::new();
        let result = broker.delete_channels(None, &ids(&["a"])).await;

        assert!(matches!(result, Err(BrokerError::ChannelsNotFound(_))));
    }

    #[tokio::test]
    async fn test_sets_survive_empty_channels() {
        let broker = Broker::new();
        let (set, sub) = broker.subscribe(None, &ids(&["a"])).await.unwrap();
        set.cancel_subscription(sub).await;

        assert_eq!(broker.set_count().await, 1);
        assert_eq!(
            broker.get_set_stats(None).await,
            Some(ChannelSetStats {
                channel_count: 0,
                subscription_count: 0
            })
        );
    }

    #[tokio::test]
    async fn test_queue_capacity_from_config() {
        let broker = Broker::with_config(BrokerConfig::default().queue_capacity(1));
        let (_set, _sub) = broker.subscribe(None, &ids(&["a"])).await.unwrap();

        let first = broker.publish(None, &ids(&["a"]), Message::text("1")).await;
        let second = broker.publish(None, &ids(&["a"]), Message::text("2")).await;
        assert_eq!(first, Ok(1));
        assert_eq!(second, Ok(0));
    }
}
