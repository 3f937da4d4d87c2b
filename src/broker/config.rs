//! Broker configuration

/// Name of the channel set used when a caller names none
pub const DEFAULT_SET_NAME: &str = "default";

/// Per-subscription queue depth
///
/// Large enough for one subscriber joined to several channels that all
/// receive a message at about the same time.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Broker configuration options
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Capacity of each subscription's inbound queue
    pub queue_capacity: usize,

    /// Channel set used when the caller supplies no set name
    pub default_set: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            default_set: DEFAULT_SET_NAME.to_string(),
        }
    }
}

impl BrokerConfig {
    /// Set the queue capacity (at least 1)
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Set the default channel set name
    pub fn default_set(mut self, name: impl Into<String>) -> Self {
        self.default_set = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();

        assert_eq!(config.queue_capacity, 5);
        assert_eq!(config.default_set, "default");
    }

    #[test]
    fn test_builder_queue_capacity_floor() {
        let config = BrokerConfig::default().queue_capacity(0);

        assert_eq!(config.queue_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = BrokerConfig::default()
            .queue_capacity(16)
            .default_set("public");

        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.default_set, "public");
    }
}
