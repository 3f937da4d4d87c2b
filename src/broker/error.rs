//! Broker error types
//!
//! Error types for channel set operations.

/// Error type for broker operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// None of the requested channels exist
    ChannelsNotFound(Vec<String>),
    /// Operation needs at least one channel id
    EmptyChannelList,
}

impl std::fmt::Display for BrokerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerError::ChannelsNotFound(ids) => {
                write!(f, "Channels do not exist ({} requested)", ids.len())
            }
            BrokerError::EmptyChannelList => write!(f, "No channel ids given"),
        }
    }
}

impl std::error::Error for BrokerError {}
