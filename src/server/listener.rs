//! Relay server listener
//!
//! Binds the TCP listener and serves the relay routes. Every connection is
//! handled on its own task; all of them share one broker.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tokio::net::TcpListener;

use crate::broker::{Broker, BrokerConfig};
use crate::error::Result;
use crate::server::config::ServerConfig;
use crate::server::handlers::{self, AppState};

/// Publish/subscribe relay server
pub struct RelayServer {
    config: ServerConfig,
    broker: Arc<Broker>,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self::with_broker_config(config, BrokerConfig::default())
    }

    /// Create a new server with custom broker configuration
    pub fn with_broker_config(config: ServerConfig, broker_config: BrokerConfig) -> Self {
        Self::with_broker(config, Arc::new(Broker::with_config(broker_config)))
    }

    /// Create a new server around an existing broker
    pub fn with_broker(config: ServerConfig, broker: Arc<Broker>) -> Self {
        Self { config, broker }
    }

    /// Get a reference to the broker
    pub fn broker(&self) -> &Arc<Broker> {
        &self.broker
    }

    /// Build the router serving the relay endpoints
    pub fn router(&self) -> Router {
        let state = AppState {
            broker: Arc::clone(&self.broker),
            config: Arc::new(self.config.clone()),
        };

        Router::new()
            .route("/pub", any(handlers::publish))
            .route("/pub/", any(handlers::publish))
            .route("/sub", any(handlers::subscribe))
            .route("/sub/", any(handlers::subscribe))
            .route("/del", any(handlers::delete))
            .route("/del/", any(handlers::delete))
            .route("/gen", get(handlers::generate))
            .route("/gen/", get(handlers::generate))
            .with_state(state)
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "Relay server listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Run the server with graceful shutdown
    ///
    /// Open subscriber streams are dropped with the server rather than
    /// drained.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.serve(listener) => result,
        }
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let config = ServerConfig::default().bind("127.0.0.1:0".parse().unwrap());
        let server = RelayServer::new(config);

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            server.run_until(tokio::time::sleep(Duration::from_millis(10))),
        )
        .await
        .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_serve_on_bound_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Arc::new(RelayServer::new(ServerConfig::with_addr(addr)));

        let task = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.serve(listener).await })
        };

        // Plain TCP round trip against the generator endpoint
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /gen?len=8 HTTP/1.0\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert_eq!(response.split_whitespace().nth(1), Some("200"));
        let body = response.rsplit("\r\n\r\n").next().unwrap();
        assert_eq!(body.len(), 8);

        task.abort();
    }
}
