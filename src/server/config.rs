//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Query parameter carrying channel ids (repeatable)
    pub channel_param: String,

    /// Query parameter naming the channel set
    pub set_param: String,

    /// Query parameter requesting a single-message response
    pub no_chunked_param: String,

    /// Query parameter giving the length of a generated channel id
    pub length_param: String,

    /// Length of generated channel ids when none is requested
    pub default_id_length: usize,

    /// Upper bound for requested channel id lengths
    pub max_id_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            channel_param: "id".to_string(),
            set_param: "set".to_string(),
            no_chunked_param: "nochunked".to_string(),
            length_param: "len".to_string(),
            default_id_length: 16,
            max_id_length: 1024,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the channel id query parameter
    pub fn channel_param(mut self, name: impl Into<String>) -> Self {
        self.channel_param = name.into();
        self
    }

    /// Set the channel set query parameter
    pub fn set_param(mut self, name: impl Into<String>) -> Self {
        self.set_param = name.into();
        self
    }

    /// Set the single-message query parameter
    pub fn no_chunked_param(mut self, name: impl Into<String>) -> Self {
        self.no_chunked_param = name.into();
        self
    }

    /// Set the default generated id length (capped at `max_id_length`)
    pub fn default_id_length(mut self, len: usize) -> Self {
        self.default_id_length = len.min(self.max_id_length);
        self
    }

    /// Set the maximum generated id length
    pub fn max_id_length(mut self, len: usize) -> Self {
        self.max_id_length = len;
        self.default_id_length = self.default_id_length.min(len);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.bind_addr.ip().is_loopback());
        assert_eq!(config.channel_param, "id");
        assert_eq!(config.set_param, "set");
        assert_eq!(config.no_chunked_param, "nochunked");
        assert_eq!(config.length_param, "len");
        assert_eq!(config.default_id_length, 16);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "0.0.0.0:9000".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.channel_param, "id");
    }

    #[test]
    fn test_builder_id_length_capped() {
        let config = ServerConfig::default()
            .max_id_length(8)
            .default_id_length(32);

        assert_eq!(config.max_id_length, 8);
        assert_eq!(config.default_id_length, 8);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .channel_param("channel")
            .set_param("ns")
            .no_chunked_param("once");

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.channel_param, "channel");
        assert_eq!(config.set_param, "ns");
        assert_eq!(config.no_chunked_param, "once");
    }
}
