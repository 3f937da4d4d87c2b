//! In-process publish/subscribe relay over HTTP
//!
//! Publishers push a message to one or more named channels; every client
//! currently subscribed to those channels receives it on a long-lived
//! chunked HTTP response. Delivery is best-effort and at-most-once: nothing
//! is persisted, and a subscriber that falls behind misses messages instead
//! of slowing the publisher down.
//!
//! # Example
//!
//! ```no_run
//! use pubsub_relay::{RelayServer, ServerConfig};
//!
//! # async fn example() -> pubsub_relay::Result<()> {
//! let config = ServerConfig::default().bind("0.0.0.0:8080".parse().unwrap());
//! let server = RelayServer::new(config);
//!
//! server.run_until(async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The broker can be used without HTTP as well:
//!
//! ```
//! use pubsub_relay::broker::{Broker, Message};
//!
//! # async fn example() {
//! let broker = Broker::new();
//! let channels = vec!["news".to_string()];
//!
//! let (set, mut sub) = broker.subscribe(None, &channels).await.unwrap();
//! let delivered = broker.publish(None, &channels, Message::text("hi")).await.unwrap();
//! assert_eq!(delivered, 1);
//! assert_eq!(sub.recv().await.unwrap().payload, "hi");
//! set.cancel_subscription(sub).await;
//! # }
//! ```

pub mod broker;
pub mod delivery;
pub mod error;
pub mod server;

pub use broker::{Broker, BrokerConfig, ChannelSet, Message, Subscription};
pub use error::{Error, Result};
pub use server::{RelayServer, ServerConfig};
