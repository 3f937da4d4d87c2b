//! In-memory publish/subscribe broker
//!
//! The broker maps channel ids to the subscriptions joined to them and fans
//! each published message out to their queues. Channels live in isolated
//! namespaces called channel sets; the same channel id in two sets never
//! shares a message.
//!
//! # Architecture
//!
//! ```text
//!                           Arc<Broker>
//!                  ┌──────────────────────────────┐
//!                  │ sets: HashMap<Name,          │
//!                  │   ChannelSet {               │
//!                  │     channels: id -> slots,   │
//!                  │     registrations: sub -> tx │
//!                  │   }                          │
//!                  │ >                            │
//!                  └──────────────┬───────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Publisher]            [Subscriber]            [Subscriber]
//!    set.publish()          sub.recv()              sub.recv()
//!         │                       │                       │
//!         └──► try_send() ──► bounded queue ──► delivery::run() ──► HTTP
//! ```
//!
//! # Delivery Contract
//!
//! Publishing never waits on a subscriber. A full queue drops the message
//! for that subscriber only. Each queue is closed exactly once, by whichever
//! of `cancel_subscription` or `delete_channels` removes its registration
//! first; both run under the set lock.

pub mod channel_set;
pub mod config;
pub mod error;
pub mod message;
pub mod slots;
pub mod store;
pub mod subscription;

pub use channel_set::{ChannelSet, ChannelSetStats};
pub use config::{BrokerConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_SET_NAME};
pub use error::BrokerError;
pub use message::{Message, DEFAULT_CONTENT_TYPE};
pub use slots::{SlotKey, SlotList};
pub use store::Broker;
pub use subscription::{Subscription, SubscriptionId};
